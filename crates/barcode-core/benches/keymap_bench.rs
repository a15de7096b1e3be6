//! Criterion benchmarks for the VK → barcode character table.
//!
//! The lookup runs inside the OS keyboard hook for every key press, so it
//! has to stay in the nanosecond range.
//!
//! Run with:
//! ```bash
//! cargo bench --package barcode-core --bench keymap_bench
//! ```

use barcode_core::keymap::vk_to_char;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A mix of mapped and unmapped VK codes, as a scanner plus a human would produce.
const BENCH_VK_CODES: &[u32] = &[
    0x39, // '9'
    0x30, // '0'
    0x32, // '2'
    0x65, // VK_NUMPAD5
    0x41, // 'A'
    0x5A, // 'Z'
    0xBD, // VK_OEM_MINUS
    0xBB, // VK_OEM_PLUS
    0x0D, // VK_RETURN (unmapped)
    0x10, // VK_SHIFT (unmapped)
    0x74, // VK_F5 (unmapped)
    0x25, // VK_LEFT (unmapped)
    0xFF, // No mapping
];

fn bench_vk_to_char(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_vk_to_char");

    for (label, vk) in [("mapped", 0x41u32), ("unmapped", 0x74), ("out_of_range", 0x1_0000)] {
        group.bench_with_input(BenchmarkId::new("single", label), &vk, |b, &vk| {
            b.iter(|| vk_to_char(black_box(vk)))
        });
    }

    group.bench_function("batch_13", |b| {
        b.iter(|| {
            BENCH_VK_CODES
                .iter()
                .map(|&vk| vk_to_char(black_box(vk)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_vk_to_char);
criterion_main!(benches);
