//! Pipeline benchmark: raw movements → coordinates → 18-feature vector.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use touchguard::features::extract_features;
use touchguard::telemetry::{parse_coordinates, MovementSample};

fn make_movements(n: usize) -> Vec<MovementSample> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.1;
            MovementSample::new(400.0 + 180.0 * t.sin(), 300.0 + 120.0 * (1.7 * t).cos())
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let movements = make_movements(500);
    c.bench_function("parse_500_movements", |b| {
        b.iter(|| black_box(parse_coordinates(black_box(&movements))))
    });
}

fn bench_feature_extraction(c: &mut Criterion) {
    let coords = parse_coordinates(&make_movements(500));
    c.bench_function("extract_features_500_coords", |b| {
        b.iter(|| black_box(extract_features(black_box(&coords), 3)))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let movements = make_movements(500);
    c.bench_function("full_pipeline_parse_to_features", |b| {
        b.iter(|| {
            let coords = parse_coordinates(&movements);
            black_box(extract_features(&coords, 3))
        })
    });
}

criterion_group!(benches, bench_parse, bench_feature_extraction, bench_full_pipeline);
criterion_main!(benches);
