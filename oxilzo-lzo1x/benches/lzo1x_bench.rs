//! Throughput benchmarks for the LZO1X codec.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxilzo_lzo1x::{Compressor, Variant, decompress};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. \
                     Pack my box with five dozen liquor jugs. \
                     How vexingly quick daft zebras jump! ";
        text.iter().copied().cycle().take(size).collect()
    }
}

const PATTERNS: [(&str, PatternGenerator); 3] = [
    ("uniform", test_data::uniform as PatternGenerator),
    ("random", test_data::random as PatternGenerator),
    ("text", test_data::text_like as PatternGenerator),
];

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzo1x_compress");
    let size = 256 * 1024;

    for (name, generator) in PATTERNS {
        let data = generator(size);
        group.throughput(Throughput::Bytes(size as u64));
        for (label, variant) in [("lzo1x_1", Variant::Lzo1x1), ("lzo1x_1_15", Variant::Lzo1x1_15)] {
            let mut compressor = Compressor::new(variant);
            let mut out = Vec::new();
            group.bench_with_input(BenchmarkId::new(label, name), &data, |b, data| {
                b.iter(|| {
                    out.clear();
                    compressor.compress_into(black_box(data), &mut out);
                    black_box(out.len());
                });
            });
        }
    }

    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzo1x_decompress");
    let size = 256 * 1024;

    for (name, generator) in PATTERNS {
        let data = generator(size);
        let packed = Compressor::default().compress(&data);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &packed, |b, packed| {
            b.iter(|| black_box(decompress(black_box(packed), size)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
