//! Integration tests for the scanner classifier.
//!
//! These tests drive `ScanClassifier` through the public crate API with
//! realistic key streams: a scanner burst interleaved with human typing,
//! stray modifier keys, and back-to-back scans.

use std::time::{Duration, Instant};

use barcode_core::{Barcode, KeyEvent, KeyOutcome, ScanClassifier, ScannerConfig};

const ENTER: u32 = 0x0D;

/// A timed key stream: (milliseconds since start, VK code, is_down).
type Script<'a> = &'a [(u64, u32, bool)];

fn run(config: ScannerConfig, script: Script<'_>) -> Vec<Barcode> {
    let mut classifier = ScanClassifier::new(config);
    let t0 = Instant::now();
    script
        .iter()
        .filter_map(|&(ms, vk, is_down)| {
            let at = t0 + Duration::from_millis(ms);
            let event = if is_down {
                KeyEvent::down(vk, at)
            } else {
                KeyEvent::up(vk, at)
            };
            match classifier.process(event) {
                KeyOutcome::Completed(barcode) => Some(barcode),
                _ => None,
            }
        })
        .collect()
}

/// Expands a string into a down/up script with `gap_ms` between key-downs.
fn typed(text: &str, start_ms: u64, gap_ms: u64) -> Vec<(u64, u32, bool)> {
    let mut script = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        let vk = match ch {
            '-' => 0xBD,
            '+' => 0xBB,
            '\n' => ENTER,
            c => u32::from(c.to_ascii_uppercase()),
        };
        let at = start_ms + i as u64 * gap_ms;
        script.push((at, vk, true));
        script.push((at + 2, vk, false));
    }
    script
}

#[test]
fn test_scanner_burst_with_key_ups_emits_full_code() {
    let script = typed("9029190001\n", 0, 12);
    let out = run(ScannerConfig::default(), &script);
    assert_eq!(out, vec![Barcode::from("9029190001")]);
}

#[test]
fn test_human_typing_before_scan_is_discarded() {
    // Arrange: a user types "abc" slowly, then the scanner fires.
    let mut script = typed("abc", 0, 220);
    script.extend(typed("M0001444\n", 1_000, 8));

    // Act
    let out = run(ScannerConfig::default(), &script);

    // Assert
    assert_eq!(out, vec![Barcode::from("M0001444")]);
}

#[test]
fn test_human_pressing_enter_produces_nothing() {
    let script = typed("ok\n", 0, 300);
    assert!(run(ScannerConfig::default(), &script).is_empty());
}

#[test]
fn test_consecutive_scans_are_emitted_in_order() {
    let mut script = typed("A-1\n", 0, 10);
    script.extend(typed("B+2\n", 50, 10));
    script.extend(typed("C3\n", 2_000, 10));

    let out = run(ScannerConfig::default(), &script);

    assert_eq!(
        out,
        vec![Barcode::from("A-1"), Barcode::from("B+2"), Barcode::from("C3")]
    );
}

#[test]
fn test_stray_function_key_inside_scan_is_skipped() {
    let script: Vec<(u64, u32, bool)> = vec![
        (0, 0x31, true),
        (10, 0x32, true),
        (20, 0x74, true), // F5
        (30, 0x33, true),
        (40, ENTER, true),
    ];
    let out = run(ScannerConfig::default(), &script);
    assert_eq!(out, vec![Barcode::from("123")]);
}

#[test]
fn test_wider_interval_merges_slower_scanner() {
    let script = typed("4711\n", 0, 150);
    let config = ScannerConfig {
        max_key_interval: Duration::from_millis(200),
        ..ScannerConfig::default()
    };
    assert_eq!(run(config, &script), vec![Barcode::from("4711")]);
    assert!(run(ScannerConfig::default(), &script).is_empty());
}
