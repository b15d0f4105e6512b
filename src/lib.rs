//! Geometry and simulation core shared by a physics engine's rigid-body
//! and cloth pipelines.
//!
//! This crate owns two independent subsystems:
//!
//! - [`hull`]: incremental (QuickHull-style) convex hull construction
//!   over a half-edge mesh, for collision-shape generation.
//! - [`cloth`]: a semi-implicit backward-Euler spring-mass solver for
//!   cloth and other deformable surfaces, with a filtered PCG inner
//!   solve for contact and pin constraints.
//!
//! Everything else a physics engine needs around these two pieces —
//! broadphase, the rigid-body solver, rendering, the scene graph — is
//! an external collaborator. [`collision::ContactProbe`] names the one
//! surface the cloth solver needs from it; this crate never implements
//! collision detection itself.

pub mod alloc;
pub(crate) mod arena;
pub mod cloth;
pub mod collision;
pub mod error;
pub mod geom;
pub(crate) mod pcg;
pub mod sparse;

pub mod hull;

pub use cloth::{Cloth, ClothConfig, MassType, StepStats};
pub use collision::{Contact, ContactProbe, Shape};
pub use error::{Error, Result};
pub use geom::{Mat33, Mat44, Plane, Quat, Transform, Vec3};
pub use hull::{Hull, HullConfig};
