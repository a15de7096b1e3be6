//! Criterion benchmarks for the scanner classifier.
//!
//! `ScanClassifier::process` is called synchronously from the low-level
//! keyboard hook.  Windows removes hooks that take longer than a few hundred
//! milliseconds, and any delay stalls input for the whole desktop, so the
//! per-key cost must be negligible.
//!
//! Run with:
//! ```bash
//! cargo bench --package barcode-core --bench classifier_bench
//! ```

use std::time::{Duration, Instant};

use barcode_core::scanner::{KeyEvent, ScanClassifier, ScannerConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ENTER: u32 = 0x0D;

/// VK codes for a 13-digit EAN barcode followed by Enter.
fn ean13_scan() -> Vec<u32> {
    let mut keys: Vec<u32> = "4006381333931".bytes().map(u32::from).collect();
    keys.push(ENTER);
    keys
}

fn bench_single_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");

    group.bench_function("process_single_key_down", |b| {
        let mut classifier = ScanClassifier::new(ScannerConfig::default());
        let mut at = Instant::now();
        b.iter(|| {
            at += Duration::from_millis(5);
            let outcome = classifier.process(black_box(KeyEvent::down(0x31, at)));
            // Keep the pending sequence from overflowing across iterations.
            if classifier.pending_len() > 200 {
                classifier.reset();
            }
            outcome
        })
    });

    group.finish();
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    let keys = ean13_scan();

    for gap_ms in [10u64, 250] {
        let id = BenchmarkId::new("ean13_scan", format!("{gap_ms}ms"));
        group.bench_with_input(id, &gap_ms, |b, &gap_ms| {
            let mut classifier = ScanClassifier::new(ScannerConfig::default());
            let mut at = Instant::now();
            b.iter(|| {
                let mut emitted = 0usize;
                for &vk in &keys {
                    at += Duration::from_millis(gap_ms);
                    if let barcode_core::KeyOutcome::Completed(barcode) =
                        classifier.process(KeyEvent::down(black_box(vk), at))
                    {
                        emitted += barcode.len();
                    }
                }
                emitted
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_key, bench_full_scan);
criterion_main!(benches);
