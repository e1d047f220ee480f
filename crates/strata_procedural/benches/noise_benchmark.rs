//! Benchmark for noise sampling performance.
//!
//! TARGET: 1,000,000 2D samples per second per base noise
//!
//! Run with: cargo bench --package strata_procedural --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_procedural::noise::{NoiseGenerator, PerlinNoise, SimplexNoise, WorldSeed};
use strata_procedural::octave::{OctaveNoise, OctaveSettings};

fn benchmark_single_sample(c: &mut Criterion) {
    let perlin = PerlinNoise::new(WorldSeed::new(42));
    let simplex = SimplexNoise::new(WorldSeed::new(42));

    let mut group = c.benchmark_group("single_sample");
    group.bench_function("perlin_2d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(perlin.noise_2d(black_box(x), black_box(x * 0.7)))
        });
    });
    group.bench_function("simplex_2d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(simplex.noise_2d(black_box(x), black_box(x * 0.7)))
        });
    });
    group.bench_function("perlin_3d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(perlin.noise_3d(black_box(x), black_box(x * 0.3), black_box(x * 0.7)))
        });
    });
    group.bench_function("simplex_3d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(simplex.noise_3d(black_box(x), black_box(x * 0.3), black_box(x * 0.7)))
        });
    });
    group.finish();
}

fn benchmark_million_samples(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    let mut group = c.benchmark_group("million_samples");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_simplex_2d", |b| {
        b.iter(|| {
            for i in 0..1_000_000 {
                let x = f64::from(i % 1000) * 0.1;
                let z = f64::from(i / 1000) * 0.1;
                black_box(noise.noise_2d(x, z));
            }
        });
    });

    group.finish();
}

fn benchmark_octave_noise(c: &mut Criterion) {
    let height = OctaveNoise::with_defaults(PerlinNoise::new(WorldSeed::new(42)));
    let caves = OctaveNoise::new(
        SimplexNoise::new(WorldSeed::new(43)),
        OctaveSettings::new(3, 0.05, 1.0, 2.0, 0.5),
    );

    c.bench_function("octave_height_4_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 1.0;
            black_box(height.sample_2d(black_box(x), black_box(x * 0.7)))
        });
    });

    c.bench_function("octave_cave_density_3_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 1.0;
            black_box(caves.sample_3d(black_box(x), black_box(40.0), black_box(x * 0.7)))
        });
    });
}

criterion_group!(
    benches,
    benchmark_single_sample,
    benchmark_million_samples,
    benchmark_octave_noise
);
criterion_main!(benches);
