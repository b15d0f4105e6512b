//! End-to-end cloth scenarios run only against the public API.

use meshphys::{Cloth, ClothConfig, MassType, Shape, Vec3};

fn grid(n: usize, spacing: f32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut verts = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let x = (col as f32 - (n - 1) as f32 / 2.0) * spacing;
            let z = (row as f32 - (n - 1) as f32 / 2.0) * spacing;
            verts.push(Vec3::new(x, 0.0, z));
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

#[test]
fn hanging_cloth_pinned_nodes_stay_fixed_and_free_corners_fall() {
    let (verts, tris) = grid(10, 1.0);
    let config = ClothConfig { density: 0.2, k_s: 10_000.0, k_d: 0.0, gravity: Vec3::new(0.0, -10.0, 0.0), ..Default::default() };
    let mut cloth = Cloth::new(&verts, &tris, config).unwrap();

    let mut pinned = Vec::new();
    for (i, v) in verts.iter().enumerate() {
        if v.x >= -5.0 && v.x <= 5.0 && v.z >= -6.0 && v.z <= -4.0 {
            cloth.set_type(i, MassType::Static);
            pinned.push(i);
        }
    }
    assert!(!pinned.is_empty());

    let pinned_before: Vec<Vec3> = pinned.iter().map(|&i| cloth.position(i)).collect();
    let h = 1.0 / 60.0;
    for _ in 0..60 {
        cloth.step(h).unwrap();
    }

    for (&i, before) in pinned.iter().zip(pinned_before.iter()) {
        assert_eq!(cloth.position(i), *before);
        assert_eq!(cloth.velocity(i), Vec3::zero());
    }

    let corner = verts.len() - 1;
    if !pinned.contains(&corner) {
        assert!(cloth.position(corner).y < 0.0, "free corner should have descended under gravity");
    }
}

#[test]
fn rest_state_is_a_noop_and_converges_quickly() {
    let (verts, tris) = grid(4, 1.0);
    let config = ClothConfig { gravity: Vec3::zero(), ..Default::default() };
    let mut cloth = Cloth::new(&verts, &tris, config).unwrap();

    let before: Vec<Vec3> = (0..cloth.mass_count()).map(|i| cloth.position(i)).collect();
    cloth.step(1.0 / 60.0).unwrap();

    assert!(cloth.iterations() <= 1);
    assert!(cloth.converged());
    for (i, p) in before.iter().enumerate() {
        assert_eq!(cloth.position(i), *p);
        assert_eq!(cloth.velocity(i), Vec3::zero());
    }
}

#[test]
fn contact_clamp_removes_downward_velocity_component() {
    let verts = vec![Vec3::new(0.0, 0.01, 0.0), Vec3::new(1.0, 0.01, 0.0), Vec3::new(0.0, 1.01, 0.0)];
    let tris = vec![[0u32, 1, 2]];
    let config = ClothConfig { rest_radius: 0.0, gravity: Vec3::new(0.0, -10.0, 0.0), ..Default::default() };
    let mut cloth = Cloth::new(&verts, &tris, config).unwrap();

    let ground = Shape::Plane { normal: Vec3::new(0.0, 1.0, 0.0), d: 0.0 };
    let h = 0.01;
    cloth.update_contacts(&ground);
    cloth.step(h).unwrap();

    for i in 0..cloth.mass_count() {
        assert!(cloth.velocity(i).y >= -1e-4, "contact filter should remove the downward normal component");
        assert!(cloth.position(i).y >= -1e-3, "contact filter should keep the mass above the plane within tolerance");
    }
}
