//! Benchmarks for focal statistics and grid algebra

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridcalc_algorithms::algebra::add;
use gridcalc_algorithms::statistics::{fill_missing, focal_mean, FocalParams};
use gridcalc_core::{GeoTransform, Grid};
use ndarray::Array2;

fn create_grid(size: usize) -> Grid {
    let values = Array2::from_shape_fn((size, size), |(row, col)| {
        let base = (row + col) as f32;
        let variation = ((row * 7 + col * 13) % 100) as f32 / 10.0;
        if (row * 31 + col * 17) % 97 == 0 {
            f32::NAN
        } else {
            base + variation
        }
    });
    Grid::new(values, None, GeoTransform::new(0.0, size as f64, 1.0, -1.0)).unwrap()
}

fn bench_focal_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("focal_mean");

    for size in [128, 256, 512].iter() {
        let grid = create_grid(*size);
        let params = FocalParams {
            buffer: 2,
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| focal_mean(black_box(&grid), &params).unwrap())
        });
    }

    group.finish();
}

fn bench_fill_missing(c: &mut Criterion) {
    let grid = create_grid(256);
    c.bench_function("fill_missing_256", |b| {
        b.iter(|| fill_missing(black_box(&grid), 3).unwrap())
    });
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for size in [256, 1024].iter() {
        let a = create_grid(*size);
        let b_grid = create_grid(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| add(black_box(&a), black_box(&b_grid)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_focal_mean, bench_fill_missing, bench_add);
criterion_main!(benches);
