use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use meshphys::{Hull, HullConfig, Vec3};

fn sphere_points(n: usize) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(n);
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    for i in 0..n {
        let y = 1.0 - (i as f32 / (n - 1) as f32) * 2.0;
        let radius = (1.0 - y * y).max(0.0).sqrt();
        let theta = golden_angle * i as f32;
        points.push(Vec3::new(theta.cos() * radius, y, theta.sin() * radius));
    }
    points
}

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("hull_construct");
    for &n in &[32usize, 128, 512] {
        let points = sphere_points(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| Hull::construct(points, &HullConfig::default()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_construct);
criterion_main!(benches);
