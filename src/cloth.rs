//! Implicit (semi-implicit backward-Euler) spring-mass cloth solver:
//! force/Jacobian assembly, the filtered PCG solve, and the stepper
//! that composes them and maintains contact state.

use tracing::{debug, instrument, warn};

use crate::collision::ContactProbe;
use crate::error::{Error, Result};
use crate::geom::{Mat33, Vec3};
use crate::sparse::{DenseVec3, DiagMat33, SparseMat33, SparseMat33Builder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MassType {
    Dynamic,
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpringKind {
    Stretch,
    Shear,
    Bend,
}

#[derive(Clone, Copy, Debug)]
struct Spring {
    i: usize,
    j: usize,
    kind: SpringKind,
    rest_length: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Contact {
    normal: Vec3,
    depth: f32,
    active: bool,
}

/// Tunables for cloth construction plus the PCG solver's own knobs.
///
/// `rest_radius` is the probe radius `update_contacts` tests every mass
/// against — the per-node "thickness" contact maintenance treats every
/// mass as occupying.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ClothConfig {
    pub density: f32,
    pub k_s: f32,
    pub k_d: f32,
    pub rest_radius: f32,
    pub gravity: Vec3,
    pub pcg_tolerance: f32,
    pub pcg_max_iter: usize,
}

impl Default for ClothConfig {
    fn default() -> Self {
        ClothConfig {
            density: 1.0,
            k_s: 0.0,
            k_d: 0.0,
            rest_radius: 0.0,
            gravity: Vec3::zero(),
            pcg_tolerance: 1e-4,
            pcg_max_iter: 30,
        }
    }
}

/// Outcome of one [`Cloth::step`] call's inner linear solve.
#[derive(Clone, Copy, Debug)]
pub struct StepStats {
    pub iterations: usize,
    pub converged: bool,
}

pub struct Cloth {
    x: DenseVec3,
    v: DenseVec3,
    mass: Vec<f32>,
    types: Vec<MassType>,
    contacts: Vec<Contact>,
    springs: Vec<Spring>,
    config: ClothConfig,
    last_stats: StepStats,
}

impl Cloth {
    /// Builds a cloth from a triangulated mesh. Springs are derived
    /// deterministically from triangle adjacency so that two calls with
    /// the same mesh produce the same spring list in the same order:
    /// a stretch spring per unique mesh edge (in triangle/edge visit
    /// order), and for every edge shared by exactly two triangles, a
    /// bend spring along that shared edge and a shear spring across the
    /// quad's other diagonal (connecting the two triangles' apex
    /// vertices).
    pub fn new(vertices: &[Vec3], triangles: &[[u32; 3]], config: ClothConfig) -> Result<Cloth> {
        let n = vertices.len();
        for tri in triangles {
            for &idx in tri {
                if idx as usize >= n {
                    return Err(Error::DegenerateInput { reason: "triangle index out of range" });
                }
            }
        }

        let mut mass = vec![0.0f32; n];
        for tri in triangles {
            let (a, b, c) = (vertices[tri[0] as usize], vertices[tri[1] as usize], vertices[tri[2] as usize]);
            let area = (b - a).cross(c - a).length() * 0.5;
            let share = area * config.density / 3.0;
            for &idx in tri {
                mass[idx as usize] += share;
            }
        }
        for m in &mass {
            if !m.is_finite() {
                return Err(Error::DegenerateInput { reason: "non-finite mass" });
            }
        }

        let mut edge_first_apex: std::collections::HashMap<(u32, u32), u32> = std::collections::HashMap::new();
        let mut seen_edges: std::collections::HashSet<(u32, u32)> = std::collections::HashSet::new();
        let mut springs = Vec::new();

        for tri in triangles {
            for e in 0..3 {
                let a = tri[e];
                let b = tri[(e + 1) % 3];
                let key = if a < b { (a, b) } else { (b, a) };
                if seen_edges.insert(key) {
                    let rest = vertices[key.0 as usize].distance_squared(vertices[key.1 as usize]).sqrt();
                    if rest <= 0.0 {
                        return Err(Error::DegenerateInput { reason: "zero-length spring" });
                    }
                    springs.push(Spring { i: key.0 as usize, j: key.1 as usize, kind: SpringKind::Stretch, rest_length: rest });
                }

                let apex = tri[(e + 2) % 3];
                match edge_first_apex.get(&key) {
                    None => {
                        edge_first_apex.insert(key, apex);
                    }
                    Some(&first_apex) => {
                        if first_apex != apex {
                            let rest_bend = vertices[key.0 as usize].distance_squared(vertices[key.1 as usize]).sqrt();
                            springs.push(Spring { i: key.0 as usize, j: key.1 as usize, kind: SpringKind::Bend, rest_length: rest_bend });

                            let (p, q) = (first_apex as usize, apex as usize);
                            let rest_shear = vertices[p].distance_squared(vertices[q]).sqrt();
                            if rest_shear > 0.0 {
                                springs.push(Spring { i: p, j: q, kind: SpringKind::Shear, rest_length: rest_shear });
                            }
                        }
                    }
                }
            }
        }

        Ok(Cloth {
            x: DenseVec3::from_vec(vertices.to_vec()),
            v: DenseVec3::zeros(n),
            mass,
            types: vec![MassType::Dynamic; n],
            contacts: vec![Contact::default(); n],
            springs,
            config,
            last_stats: StepStats { iterations: 0, converged: true },
        })
    }

    pub fn mass_count(&self) -> usize {
        self.x.len()
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.x.as_slice()[i]
    }

    pub fn velocity(&self, i: usize) -> Vec3 {
        self.v.as_slice()[i]
    }

    pub fn mass_type(&self, i: usize) -> MassType {
        self.types[i]
    }

    pub fn set_type(&mut self, i: usize, ty: MassType) {
        self.types[i] = ty;
    }

    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.x.as_mut_slice()[i] = p;
    }

    pub fn set_velocity(&mut self, i: usize, v: Vec3) {
        self.v.as_mut_slice()[i] = v;
    }

    pub fn iterations(&self) -> usize {
        self.last_stats.iterations
    }

    pub fn converged(&self) -> bool {
        self.last_stats.converged
    }

    /// Per-node sum of incident internal spring force magnitudes, a
    /// pure read of post-`Step` state used for tension visualization.
    pub fn tension(&self) -> Vec<f32> {
        let mut out = vec![0.0f32; self.x.len()];
        for s in &self.springs {
            let d = self.x.as_slice()[s.j] - self.x.as_slice()[s.i];
            let len = d.length();
            let force = (len - s.rest_length).abs() * self.config.k_s;
            out[s.i] += force;
            out[s.j] += force;
        }
        out
    }

    /// Probes every dynamic mass against `probe` using the cloth's
    /// configured `rest_radius`, updating contact state used as the
    /// next `Step`'s constraint filter.
    pub fn update_contacts(&mut self, probe: &dyn ContactProbe) {
        let radius = self.config.rest_radius;
        for i in 0..self.x.len() {
            if self.types[i] == MassType::Static {
                self.contacts[i] = Contact::default();
                continue;
            }
            self.contacts[i] = match probe.test_sphere(self.x.as_slice()[i], radius) {
                Some(c) => Contact { normal: c.normal, depth: c.depth, active: true },
                None => Contact::default(),
            };
        }
    }

    /// Block-diagonal constraint filter `S` (zero for static masses,
    /// `I - n*n^T` for an active contact, identity otherwise).
    fn constraint_filter(&self) -> DiagMat33 {
        let n = self.x.len();
        let mut s_blocks = Vec::with_capacity(n);
        for i in 0..n {
            let block = match self.types[i] {
                MassType::Static => Mat33::zero(),
                MassType::Dynamic if self.contacts[i].active => {
                    let nrm = self.contacts[i].normal;
                    Mat33::identity().sub(&nrm.outer(nrm))
                }
                MassType::Dynamic => Mat33::identity(),
            };
            s_blocks.push(block);
        }
        DiagMat33::from_blocks(s_blocks)
    }

    /// Assembles `A = M - h*Jv - h^2*Jx` and `b = h*(f + h*Jx*v)`.
    fn assemble(&self, h: f32) -> Result<(SparseMat33, DenseVec3)> {
        let n = self.x.len();
        let mut force = DenseVec3::zeros(n);
        for i in 0..n {
            force.as_mut_slice()[i] = self.config.gravity.scale(self.mass[i]);
        }

        let mut jx_builder = SparseMat33Builder::new(n, n);
        let mut jv_builder = SparseMat33Builder::new(n, n);

        for s in &self.springs {
            let (i, j) = (s.i, s.j);
            let d = self.x.as_slice()[j] - self.x.as_slice()[i];
            let len = d.length();
            if len <= f32::EPSILON {
                continue;
            }
            let u = d.scale(1.0 / len);

            let f_spring = u.scale(self.config.k_s * (len - s.rest_length));
            let rel_v = self.v.as_slice()[j] - self.v.as_slice()[i];
            let f_damp = u.scale(self.config.k_d * rel_v.dot(u));
            let f_total = f_spring + f_damp;
            force.as_mut_slice()[i] = force.as_slice()[i] + f_total;
            force.as_mut_slice()[j] = force.as_slice()[j] - f_total;

            let uu = u.outer(u);
            let k = Mat33::identity()
                .scale(self.config.k_s * (1.0 - s.rest_length / len))
                .add(&uu.scale(self.config.k_s * s.rest_length / len));
            jx_builder.add_block(i, i, k);
            jx_builder.add_block(j, j, k);
            jx_builder.add_block(i, j, k.scale(-1.0));
            jx_builder.add_block(j, i, k.scale(-1.0));

            let damp = uu.scale(self.config.k_d);
            jv_builder.add_block(i, i, damp);
            jv_builder.add_block(j, j, damp);
            jv_builder.add_block(i, j, damp.scale(-1.0));
            jv_builder.add_block(j, i, damp.scale(-1.0));
        }

        let jx = jx_builder.build();
        let jv = jv_builder.build();
        let mass_diag = DiagMat33::from_blocks(self.mass.iter().map(|&m| Mat33::diagonal(m)).collect());
        let m_sparse = SparseMat33::from_diag(&mass_diag);

        let a = m_sparse.add(&jv.scale(-h))?.add(&jx.scale(-h * h))?;

        let jx_v = jx.multiply(&self.v)?;
        let b = force.add(&jx_v.scale(h)).scale(h);

        Ok((a, b))
    }

    /// Advances the cloth by `h`: assembles the linear system, solves
    /// it under the current contact/pin filter, and integrates
    /// positions and velocities. Static masses are left untouched.
    #[instrument(skip(self))]
    pub fn step(&mut self, h: f32) -> Result<StepStats> {
        if h <= 0.0 {
            return Err(Error::DegenerateInput { reason: "timestep must be positive" });
        }

        let s = self.constraint_filter();
        let mut z = DenseVec3::zeros(self.x.len());
        for i in 0..self.x.len() {
            if self.types[i] == MassType::Dynamic && self.contacts[i].active && self.contacts[i].depth > 0.0 {
                z.as_mut_slice()[i] = self.contacts[i].normal.scale(self.contacts[i].depth / h);
            }
        }

        let (a, b) = self.assemble(h)?;
        let stats = crate::pcg::solve(&a, &b, &s, &z, self.config.pcg_tolerance, self.config.pcg_max_iter)?;
        self.last_stats = StepStats { iterations: stats.iterations, converged: stats.converged };

        if !stats.converged {
            warn!(iterations = stats.iterations, "cloth PCG solve hit max_iter without converging");
        }
        debug!(iterations = stats.iterations, converged = stats.converged, "cloth step solved");

        for i in 0..self.x.len() {
            if self.types[i] == MassType::Static {
                self.v.as_mut_slice()[i] = Vec3::zero();
                continue;
            }
            self.v.as_mut_slice()[i] = self.v.as_slice()[i] + stats.delta_v.as_slice()[i];
            self.x.as_mut_slice()[i] = self.x.as_slice()[i] + self.v.as_slice()[i].scale(h);
        }

        Ok(self.last_stats)
    }
}
