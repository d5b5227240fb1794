use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::hint::black_box;
use ckks_similarity::compression::{Filter, SpectralCompressor, batch_fft, fft};

fn random_signal(len: usize, rng: &mut ChaCha20Rng) -> Vec<Complex64> {
    (0..len)
        .map(|_| Complex64::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
        .collect()
}

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft");
    let mut rng = ChaCha20Rng::seed_from_u64(1);

    for &log in &[8u32, 12, 16] {
        let len = 1usize << log;
        let signal = random_signal(len, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(len), &signal, |b, signal| {
            b.iter_batched_ref(
                || signal.clone(),
                |buf| fft(black_box(buf)),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    let rows: Vec<Vec<Complex64>> = (0..64).map(|_| random_signal(4096, &mut rng)).collect();
    group.bench_function("batch_64x4096", |b| {
        b.iter_batched_ref(
            || rows.clone(),
            |rows| batch_fft(black_box(rows)),
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_compressor(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let vectors: Vec<Vec<f64>> = (0..256)
        .map(|_| (0..1000).map(|_| rng.random_range(-1.0..1.0)).collect())
        .collect();
    let compressor = SpectralCompressor::new(Filter::LowPass { cutoff: 128 });

    c.bench_function("compress_batch_256x1000", |b| {
        b.iter(|| black_box(compressor.compress_batch(black_box(&vectors))))
    });
}

criterion_group!(spectral, bench_fft, bench_compressor);
criterion_main!(spectral);
