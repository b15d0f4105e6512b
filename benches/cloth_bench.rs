use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use meshphys::{Cloth, ClothConfig, Vec3};

fn grid(n: usize) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut verts = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            verts.push(Vec3::new(col as f32, 0.0, row as f32));
        }
    }
    let mut tris = Vec::new();
    for row in 0..n - 1 {
        for col in 0..n - 1 {
            let a = (row * n + col) as u32;
            let b = a + 1;
            let c = a + n as u32;
            let d = c + 1;
            tris.push([a, b, c]);
            tris.push([b, d, c]);
        }
    }
    (verts, tris)
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloth_step");
    for &n in &[8usize, 16, 32] {
        let (verts, tris) = grid(n);
        let config = ClothConfig { k_s: 5000.0, gravity: Vec3::new(0.0, -10.0, 0.0), ..Default::default() };
        group.bench_with_input(BenchmarkId::from_parameter(n * n), &(verts, tris), |b, (verts, tris)| {
            let mut cloth = Cloth::new(verts, tris, config).unwrap();
            b.iter(|| cloth.step(1.0 / 60.0).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
