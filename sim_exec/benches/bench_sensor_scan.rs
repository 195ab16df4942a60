//! # Sensor Scan Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nalgebra::{Point2, Vector2};
use sim_lib::{
    geom::Segment,
    loc::Pose,
    obstacle::ObstacleField,
    sensor::SensorArray
};

fn sensor_scan_benchmark(c: &mut Criterion) {
    // ---- Build a cluttered field ----

    // A grid of short diagonal walls, plus the field edges
    let mut obstacles = Vec::new();
    for i in 0..20 {
        for j in 0..15 {
            let x = 20.0 + 40.0 * i as f64;
            let y = 20.0 + 40.0 * j as f64;
            obstacles.push(Segment::from_coords(x, y, x + 15.0, y + 10.0));
        }
    }

    let field = ObstacleField::enclosed(obstacles, Vector2::new(800.0, 600.0));
    let pose = Pose::new(Point2::new(410.0, 305.0), 0.3);

    // Full scan with the largest sensor array
    let mut full = SensorArray::new(255, 0.0, None);
    c.bench_function("SensorArray::scan::255", |b| {
        b.iter(|| full.scan(black_box(&pose), 10.0, &field))
    });

    // Default array, range limited
    let mut limited = SensorArray::new(8, 0.0, Some(100.0));
    c.bench_function("SensorArray::scan::8_limited", |b| {
        b.iter(|| limited.scan(black_box(&pose), 10.0, &field))
    });
}

criterion_group!(benches, sensor_scan_benchmark);
criterion_main!(benches);
