//! Criterion benchmarks for DA3D core operations.
//!
//! Run with: cargo bench
//! Run specific: cargo bench -- bench_dft_patch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array2, Array3};
use rand::prelude::*;

use da3d_core::patch_ops::{bilateral_weight, compute_regression_plane, modify_patch};
use da3d_core::{da3d_denoise, run_da3d_block, Da3dConfig, DftPatch, DftPlans, WeightMap};

// =============================================================================
// Helper Functions for Test Data Generation
// =============================================================================

fn random_image(rows: usize, cols: usize, channels: usize, seed: u64) -> Array3<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array3::from_shape_fn((rows, cols, channels), |_| rng.gen())
}

fn random_kernel(side: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((side, side), |_| 0.01f32 + rng.gen::<f32>())
}

// =============================================================================
// DFT Patch Benchmarks
// =============================================================================

fn bench_dft_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dft_patch");

    for side in [8, 16, 32] {
        let plans = DftPlans::<f32>::new(side);
        let image = random_image(side, side, 1, 42);

        group.throughput(Throughput::Elements((side * side) as u64));

        group.bench_with_input(BenchmarkId::new("roundtrip", side), &side, |b, _| {
            let mut patch = DftPatch::new(1, &plans);
            b.iter(|| {
                for row in 0..side {
                    for col in 0..side {
                        patch.set_space(col, row, 0, black_box(image[[row, col, 0]]));
                    }
                }
                patch.to_freq();
                patch.to_space();
            })
        });
    }

    group.finish();
}

// =============================================================================
// Patch Op Benchmarks
// =============================================================================

fn bench_patch_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_ops");

    for side in [16, 32] {
        let r = side / 2 - 1;
        let g = random_image(side, side, 3, 7);
        let y = random_image(side, side, 3, 8);
        let mut k = Array2::<f32>::zeros((side, side));

        group.throughput(Throughput::Elements((side * side) as u64));

        group.bench_with_input(BenchmarkId::new("bilateral_weight", side), &side, |b, _| {
            b.iter(|| bilateral_weight(black_box(&g), &mut k, r, 0.01, 196.0))
        });

        bilateral_weight(&g, &mut k, r, 0.01, 196.0);
        let mut plane = vec![[0.0f32; 2]; 3];
        group.bench_with_input(
            BenchmarkId::new("regression_plane", side),
            &side,
            |b, _| b.iter(|| compute_regression_plane(black_box(&y), &g, &k, r, &mut plane)),
        );

        let plans = DftPlans::new(side);
        let mut modified = DftPatch::new(3, &plans);
        let mut avg = [0.0f32; 3];
        group.bench_with_input(BenchmarkId::new("modify_patch", side), &side, |b, _| {
            b.iter(|| modify_patch(black_box(&y), &k, &mut modified, Some(&mut avg)))
        });
    }

    group.finish();
}

// =============================================================================
// Weight Map Benchmarks
// =============================================================================

fn bench_weight_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("weight_map");

    for size in [64, 128] {
        let k = random_kernel(32, 11);

        group.bench_with_input(
            BenchmarkId::new("increase_and_find", size),
            &size,
            |b, &size| {
                b.iter(|| {
                    let mut map = WeightMap::<f32>::new(size, size);
                    for step in 0..32 {
                        let (pr, pc) = map.find_minimum();
                        map.increase_weights(
                            black_box(&k),
                            pr as isize - 8 + (step % 3),
                            pc as isize - 8,
                        );
                    }
                    map.minimum()
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// Block Engine and End-to-End Benchmarks
// =============================================================================

fn bench_block_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_engine");
    group.sample_size(10);

    let clean = Array3::from_shape_fn((64, 64, 1), |(row, col, _)| {
        0.5 + 0.3 * ((row as f32 / 16.0).sin() + (col as f32 / 16.0).cos())
    });
    let mut rng = StdRng::seed_from_u64(3);
    let noisy = clean.mapv(|v| v + (rng.gen::<f32>() - 0.5) * 0.1);
    let plans = DftPlans::new(8);

    group.bench_function("tile_64x64_r2", |b| {
        b.iter(|| {
            run_da3d_block(
                black_box(&noisy),
                &clean,
                0.05f32,
                2,
                14.0,
                0.7,
                0.8,
                2.0,
                &plans,
            )
        })
    });

    group.finish();
}

fn bench_denoise(c: &mut Criterion) {
    let mut group = c.benchmark_group("denoise");
    group.sample_size(10);

    let clean = Array3::from_shape_fn((128, 128, 1), |(row, col, _)| {
        0.5 + 0.3 * ((row as f32 / 32.0).sin() + (col as f32 / 32.0).cos())
    });
    let mut rng = StdRng::seed_from_u64(9);
    let noisy = clean.mapv(|v| v + (rng.gen::<f32>() - 0.5) * 0.1);

    let config = Da3dConfig::<f32> {
        patch_radius: 2,
        n_threads: 1,
        ..Da3dConfig::default()
    };

    group.bench_function("guided_128x128_r2_single_thread", |b| {
        b.iter(|| da3d_denoise(black_box(noisy.view()), clean.view(), 0.05, &config).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_dft_patch,
    bench_patch_ops,
    bench_weight_map,
    bench_block_engine,
    bench_denoise
);
criterion_main!(benches);
