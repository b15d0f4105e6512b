//! Interfaces the cores expect from their external collaborators.
//!
//! This module does not implement a collision system: broadphase,
//! SAT, and closest-point math live outside the two cores entirely.
//! It names the one surface the cloth solver's contact maintenance
//! needs (`ContactProbe`), plus a small closed-variant `Shape` a
//! collaborator can use to implement it without dynamic dispatch.

use crate::geom::Vec3;

/// Result of probing a sphere against a collaborator's geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub depth: f32,
    pub normal: Vec3,
}

/// What the cloth solver's contact maintenance needs from a collider.
/// Implemented by whatever collision/broadphase system owns the scene;
/// the core only ever calls through this trait.
pub trait ContactProbe {
    /// Tests a sphere of `radius` at `center` against this collaborator's
    /// geometry. Returns penetration depth and outward surface normal
    /// when the sphere overlaps.
    fn test_sphere(&self, center: Vec3, radius: f32) -> Option<Contact>;
}

/// A closed set of primitive collider variants, tagged rather than
/// dynamically dispatched (the set is small and fixed).
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Plane { normal: Vec3, d: f32 },
    Sphere { center: Vec3, radius: f32 },
}

impl ContactProbe for Shape {
    fn test_sphere(&self, center: Vec3, radius: f32) -> Option<Contact> {
        match *self {
            Shape::Plane { normal, d } => {
                let dist = normal.dot(center) - d;
                let depth = radius - dist;
                if depth > 0.0 {
                    Some(Contact { depth, normal })
                } else {
                    None
                }
            }
            Shape::Sphere { center: sc, radius: sr } => {
                let d = center - sc;
                let dist = d.length();
                let depth = (radius + sr) - dist;
                if depth > 0.0 {
                    let normal = if dist > 0.0 { d.scale(1.0 / dist) } else { Vec3::new(0.0, 1.0, 0.0) };
                    Some(Contact { depth, normal })
                } else {
                    None
                }
            }
        }
    }
}
