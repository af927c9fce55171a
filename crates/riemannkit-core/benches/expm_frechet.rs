//! Benchmarks for the matrix exponential and its Fréchet derivative.
//!
//! Compares the allocating entry point with the buffered one across matrix
//! sizes and norms (small norms stay on low Padé degrees, large ones go
//! through scaling and squaring).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::DMatrix;
use rand::prelude::*;
use riemannkit_core::numerical::{expm, expm_frechet, expm_frechet_with_buffer, PadeBuffer};

fn random_matrix(rng: &mut StdRng, n: usize, scale: f64) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0) * scale / n as f64)
}

fn bench_expm_frechet_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("expm_frechet");
    let mut rng = StdRng::seed_from_u64(42);

    for n in [4, 16, 64] {
        let a = random_matrix(&mut rng, n, 1.0);
        let e = random_matrix(&mut rng, n, 1.0);

        group.bench_with_input(BenchmarkId::new("allocating", n), &n, |b, _| {
            b.iter(|| black_box(expm_frechet(black_box(&a), black_box(&e)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("buffered", n), &n, |b, &n| {
            let mut buffer = PadeBuffer::new(n);
            let mut exp_a = DMatrix::zeros(n, n);
            let mut frechet = DMatrix::zeros(n, n);
            b.iter(|| {
                expm_frechet_with_buffer(&mut buffer, &mut exp_a, &mut frechet, black_box(&a), black_box(&e))
                    .unwrap();
                black_box(&frechet);
            });
        });

        group.bench_with_input(BenchmarkId::new("expm_only", n), &n, |b, _| {
            b.iter(|| black_box(expm(black_box(&a)).unwrap()));
        });
    }

    group.finish();
}

fn bench_expm_frechet_norms(c: &mut Criterion) {
    let mut group = c.benchmark_group("expm_frechet_norm");
    let mut rng = StdRng::seed_from_u64(7);
    let n = 16;

    for scale in [0.01, 0.5, 3.0, 50.0] {
        let a = random_matrix(&mut rng, n, scale * n as f64);
        let e = random_matrix(&mut rng, n, 1.0);
        group.bench_with_input(BenchmarkId::from_parameter(scale), &scale, |b, _| {
            b.iter(|| black_box(expm_frechet(black_box(&a), black_box(&e)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_expm_frechet_sizes, bench_expm_frechet_norms);
criterion_main!(benches);
