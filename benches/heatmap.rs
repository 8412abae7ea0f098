//! Benchmarks for speed texture generation.
//!
//! Run with: `cargo bench --bench heatmap`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use windvis::heatmap::{speed_texture, viridis, HEATMAP_SIZE};
use windvis::synthetic;

fn bench_speed_texture(c: &mut Criterion) {
    let field = synthetic::global_field(0).unwrap();
    let max_speed = field.max_speed();
    let mut group = c.benchmark_group("speed_texture");

    for size in [256usize, HEATMAP_SIZE, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| black_box(speed_texture(&field, max_speed, size)))
        });
    }

    group.finish();
}

fn bench_viridis(c: &mut Criterion) {
    c.bench_function("viridis_256", |b| {
        b.iter(|| {
            for i in 0..256 {
                black_box(viridis(i as f32 / 255.0));
            }
        })
    });
}

fn bench_synthetic_field(c: &mut Criterion) {
    c.bench_function("synthetic_global_field", |b| {
        b.iter(|| black_box(synthetic::global_field(black_box(6))))
    });
}

criterion_group!(benches, bench_speed_texture, bench_viridis, bench_synthetic_field);
criterion_main!(benches);
