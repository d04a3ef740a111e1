//! Throughput benchmarks for the Adler-32 and CRC-32 engines.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxilzo_core::checksum::{Adler32, Checksum, Crc32};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    pub fn zeros(size: usize) -> Vec<u8> {
        vec![0; size]
    }

    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. ";
        text.iter().copied().cycle().take(size).collect()
    }
}

fn bench_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_sizes");

    for size in [16usize, 256, 4 * 1024, 256 * 1024] {
        let data = test_data::text_like(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("crc32", size), &data, |b, data| {
            b.iter(|| black_box(Crc32::compute(black_box(data))));
        });
        group.bench_with_input(BenchmarkId::new("adler32", size), &data, |b, data| {
            b.iter(|| black_box(Adler32::compute(black_box(data))));
        });
    }

    group.finish();
}

fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_patterns");
    let size = 64 * 1024;

    let patterns: [(&str, PatternGenerator); 3] = [
        ("random", test_data::random as PatternGenerator),
        ("zeros", test_data::zeros as PatternGenerator),
        ("text", test_data::text_like as PatternGenerator),
    ];

    for (name, generator) in patterns {
        let data = generator(size);
        group.throughput(Throughput::Bytes(size as u64));
        for kind in [Checksum::Adler32, Checksum::Crc32] {
            group.bench_with_input(BenchmarkId::new(kind.name(), name), &data, |b, data| {
                b.iter(|| black_box(kind.compute(black_box(data))));
            });
        }
    }

    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum_incremental");
    let size = 64 * 1024;
    let data = test_data::text_like(size);

    for chunk_size in [256, 4096, 16384] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunks_{}", chunk_size)),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut running = Checksum::Crc32.hasher();
                    for chunk in data.chunks(chunk_size) {
                        running.update(black_box(chunk));
                    }
                    black_box(running.value());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sizes, bench_patterns, bench_incremental);
criterion_main!(benches);
