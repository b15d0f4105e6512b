//! Incremental convex hull construction (QuickHull-style), operating
//! over an arena-indexed half-edge mesh instead of the source's
//! intrusive pointer lists.
//!
//! `Hull::construct` is a single self-contained call: the arena is
//! built fresh, grown as needed, and entirely owned by the returned
//! `Hull`. There is no shared pool across calls (see the crate's
//! concurrency notes): each `Hull` is its own lifecycle.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::geom::{Plane, Vec3};

use crate::arena::Arena;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HalfEdgeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FaceState {
    Visible,
    Invisible,
}

#[derive(Clone, Debug)]
struct Vertex {
    position: Vec3,
    /// `Some` while the vertex is an unabsorbed conflict point; `None`
    /// once it has become a hull vertex (referenced by some edge).
    conflict_face: Option<FaceId>,
}

#[derive(Clone, Copy, Debug)]
struct HalfEdge {
    tail: VertexId,
    twin: Option<HalfEdgeId>,
    next: Option<HalfEdgeId>,
    prev: Option<HalfEdgeId>,
    face: FaceId,
}

#[derive(Clone, Debug)]
struct Face {
    edge: HalfEdgeId,
    plane: Plane,
    center: Vec3,
    state: FaceState,
    conflict: Vec<VertexId>,
}

/// Tunable knobs for [`Hull::construct`].
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct HullConfig {
    /// Overrides the derived tolerance `3 * extent * EPSILON` when set.
    pub epsilon_override: Option<f32>,
    /// Safety cap on main-loop iterations; `None` derives `4 * point_count`.
    pub max_iterations: Option<usize>,
}

impl Default for HullConfig {
    fn default() -> Self {
        HullConfig { epsilon_override: None, max_iterations: None }
    }
}

/// An incrementally constructed convex polytope.
pub struct Hull {
    vertices: Arena<Vertex>,
    edges: Arena<HalfEdge>,
    faces: Arena<Face>,
    tolerance: f32,
}

impl Hull {
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.iter_live().map(|(i, _)| FaceId(i))
    }

    pub fn face_count(&self) -> usize {
        self.faces.live_count()
    }

    pub fn face_plane(&self, f: FaceId) -> Plane {
        self.faces.get(f.0).plane
    }

    pub fn face_center(&self, f: FaceId) -> Vec3 {
        self.faces.get(f.0).center
    }

    /// Boundary vertex ids of a face, in CCW traversal order.
    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        let start = self.faces.get(f.0).edge;
        let mut out = Vec::new();
        let mut cur = start;
        loop {
            let e = self.edges.get(cur.0);
            out.push(e.tail);
            cur = e.next.expect("live edge must have next");
            if cur == start {
                break;
            }
        }
        out
    }

    pub fn vertex_position(&self, v: VertexId) -> Vec3 {
        self.vertices.get(v.0).position
    }

    /// Constructs a convex hull over `points` per the incremental
    /// (QuickHull-style) algorithm: initial simplex, then repeated
    /// eye-vertex insertion with horizon finding and coplanar/concave
    /// face merging.
    #[instrument(skip(points, config))]
    pub fn construct(points: &[Vec3], config: &HullConfig) -> Result<Hull> {
        if points.len() < 4 {
            return Err(Error::DegenerateInput { reason: "fewer than 4 points" });
        }

        let tolerance = config.epsilon_override.unwrap_or_else(|| compute_tolerance(points));

        let mut hull = Hull {
            vertices: Arena::with_capacity(points.len()),
            edges: Arena::with_capacity(euler_edge_bound(points.len())),
            faces: Arena::with_capacity(euler_face_bound(points.len())),
            tolerance,
        };

        hull.build_initial_tetrahedron(points)?;

        let max_iterations = config.max_iterations.unwrap_or(points.len().saturating_mul(4).max(64));
        let mut iterations = 0usize;
        while let Some((face, vertex)) = hull.find_eye() {
            if iterations >= max_iterations {
                return Err(Error::InternalInconsistency { invariant: "hull main loop exceeded iteration safety cap" });
            }
            hull.remove_from_conflict_list(face, vertex);
            let eye_pos = hull.vertices.get(vertex.0).position;
            let horizon = hull.find_horizon(eye_pos)?;
            let new_faces = hull.add_new_faces(vertex, &horizon)?;
            for f in new_faces {
                if hull.faces.is_live(f.0) {
                    hull.merge_fixed_point(f)?;
                }
            }
            debug!(iterations, faces = hull.face_count(), "hull iteration complete");
            iterations += 1;
        }

        Ok(hull)
    }

    fn build_initial_tetrahedron(&mut self, points: &[Vec3]) -> Result<()> {
        let mut axis_min = [0usize; 3];
        let mut axis_max = [0usize; 3];
        for axis in 0..3 {
            let mut min_v = points[0][axis];
            let mut max_v = points[0][axis];
            for (i, p) in points.iter().enumerate() {
                if p[axis] < min_v {
                    min_v = p[axis];
                    axis_min[axis] = i;
                }
                if p[axis] > max_v {
                    max_v = p[axis];
                    axis_max[axis] = i;
                }
            }
        }

        let (mut i1, mut i2) = (axis_min[0], axis_max[0]);
        let mut best_d = points[i1].distance_squared(points[i2]);
        for axis in 1..3 {
            let (a, b) = (axis_min[axis], axis_max[axis]);
            let d = points[a].distance_squared(points[b]);
            if d > best_d {
                best_d = d;
                i1 = a;
                i2 = b;
            }
        }
        if best_d <= self.tolerance * self.tolerance {
            return Err(Error::DegenerateInput { reason: "all points coincide" });
        }

        let a = points[i1];
        let b = points[i2];
        let mut i3 = None;
        let mut best_area = 0.0f32;
        for (i, &c) in points.iter().enumerate() {
            if i == i1 || i == i2 {
                continue;
            }
            let area_sq = (b - a).cross(c - a).length_squared();
            if area_sq > best_area {
                best_area = area_sq;
                i3 = Some(i);
            }
        }
        let i3 = i3.ok_or(Error::DegenerateInput { reason: "all points colinear" })?;
        let two_eps = 2.0 * self.tolerance;
        if best_area <= two_eps * two_eps {
            return Err(Error::DegenerateInput { reason: "all points colinear" });
        }

        let c = points[i3];
        let base_plane = Plane::from_points(a, b, c);

        let mut i4 = None;
        let mut best_dist = 0.0f32;
        for (i, &p) in points.iter().enumerate() {
            if i == i1 || i == i2 || i == i3 {
                continue;
            }
            let d = base_plane.distance(p).abs();
            if d > best_dist {
                best_dist = d;
                i4 = Some(i);
            }
        }
        let i4 = i4.ok_or(Error::DegenerateInput { reason: "all points coplanar" })?;
        if best_dist <= self.tolerance {
            return Err(Error::DegenerateInput { reason: "all points coplanar" });
        }
        let d = points[i4];

        let v1 = self.vertices.alloc(Vertex { position: a, conflict_face: None });
        let v2 = self.vertices.alloc(Vertex { position: b, conflict_face: None });
        let v3 = self.vertices.alloc(Vertex { position: c, conflict_face: None });
        let v4 = self.vertices.alloc(Vertex { position: d, conflict_face: None });
        let (v1, v2, v3, v4) = (VertexId(v1), VertexId(v2), VertexId(v3), VertexId(v4));

        let mut pair_map: HashMap<(u32, u32), HalfEdgeId> = HashMap::new();
        let faces = if base_plane.distance(d) < 0.0 {
            [
                self.add_face([v1, v2, v3], &mut pair_map),
                self.add_face([v4, v2, v1], &mut pair_map),
                self.add_face([v4, v3, v2], &mut pair_map),
                self.add_face([v4, v1, v3], &mut pair_map),
            ]
        } else {
            [
                self.add_face([v1, v3, v2], &mut pair_map),
                self.add_face([v4, v1, v2], &mut pair_map),
                self.add_face([v4, v2, v3], &mut pair_map),
                self.add_face([v4, v3, v1], &mut pair_map),
            ]
        };

        for (i, &p) in points.iter().enumerate() {
            if i == i1 || i == i2 || i == i3 || i == i4 {
                continue;
            }
            let mut best_face = None;
            let mut best_d = self.tolerance;
            for &f in &faces {
                let dist = self.faces.get(f.0).plane.distance(p);
                if dist > best_d {
                    best_d = dist;
                    best_face = Some(f);
                }
            }
            if let Some(f) = best_face {
                let vid = self.vertices.alloc(Vertex { position: p, conflict_face: Some(f) });
                self.faces.get_mut(f.0).conflict.push(VertexId(vid));
            }
        }

        Ok(())
    }

    /// Creates a triangular face `verts[0], verts[1], verts[2]` (CCW),
    /// pairing its edges against any opposite-direction edge already
    /// present in `pair_map`.
    fn add_face(&mut self, verts: [VertexId; 3], pair_map: &mut HashMap<(u32, u32), HalfEdgeId>) -> FaceId {
        let plane = Plane::from_points(
            self.vertices.get(verts[0].0).position,
            self.vertices.get(verts[1].0).position,
            self.vertices.get(verts[2].0).position,
        );
        let center = centroid(&[
            self.vertices.get(verts[0].0).position,
            self.vertices.get(verts[1].0).position,
            self.vertices.get(verts[2].0).position,
        ]);

        let face_idx = self.faces.alloc(Face {
            edge: HalfEdgeId(0), // patched below
            plane,
            center,
            state: FaceState::Invisible,
            conflict: Vec::new(),
        });
        let face = FaceId(face_idx);

        let mut edge_ids = [HalfEdgeId(0); 3];
        for i in 0..3 {
            let idx = self.edges.alloc(HalfEdge {
                tail: verts[i],
                twin: None,
                next: None,
                prev: None,
                face,
            });
            edge_ids[i] = HalfEdgeId(idx);
        }
        for i in 0..3 {
            let next = edge_ids[(i + 1) % 3];
            let prev = edge_ids[(i + 2) % 3];
            let e = self.edges.get_mut(edge_ids[i].0);
            e.next = Some(next);
            e.prev = Some(prev);
        }
        self.faces.get_mut(face.0).edge = edge_ids[0];

        for i in 0..3 {
            let tail = verts[i];
            let head = verts[(i + 1) % 3];
            let key = (tail.0, head.0);
            let opposite = (head.0, tail.0);
            if let Some(&twin_id) = pair_map.get(&opposite) {
                self.edges.get_mut(edge_ids[i].0).twin = Some(twin_id);
                self.edges.get_mut(twin_id.0).twin = Some(edge_ids[i]);
            } else {
                pair_map.insert(key, edge_ids[i]);
            }
        }

        face
    }

    fn remove_from_conflict_list(&mut self, face: FaceId, vertex: VertexId) {
        let conflict = &mut self.faces.get_mut(face.0).conflict;
        conflict.retain(|&v| v != vertex);
        self.vertices.get_mut(vertex.0).conflict_face = None;
    }

    fn find_eye(&self) -> Option<(FaceId, VertexId)> {
        let mut best: Option<(FaceId, VertexId, f32)> = None;
        for (fi, face) in self.faces.iter_live() {
            for &v in &face.conflict {
                let d = face.plane.distance(self.vertices.get(v.0).position);
                if d > self.tolerance {
                    let better = match &best {
                        None => true,
                        Some((_, _, best_d)) => d > *best_d,
                    };
                    if better {
                        best = Some((FaceId(fi), v, d));
                    }
                }
            }
        }
        best.map(|(f, v, _)| (f, v))
    }

    fn find_horizon(&mut self, eye: Vec3) -> Result<Vec<HalfEdgeId>> {
        let live_faces: Vec<FaceId> = self.face_ids().collect();
        for &f in &live_faces {
            let face = self.faces.get_mut(f.0);
            face.state = if face.plane.distance(eye) > self.tolerance {
                FaceState::Visible
            } else {
                FaceState::Invisible
            };
        }

        let mut horizon = Vec::new();
        for &f in &live_faces {
            if self.faces.get(f.0).state != FaceState::Visible {
                continue;
            }
            let start = self.faces.get(f.0).edge;
            let mut cur = start;
            loop {
                let edge = *self.edges.get(cur.0);
                let twin = edge.twin.expect("live edge must have a twin");
                let twin_face = self.edges.get(twin.0).face;
                if self.faces.get(twin_face.0).state == FaceState::Invisible {
                    horizon.push(cur);
                }
                cur = edge.next.expect("live edge must have next");
                if cur == start {
                    break;
                }
            }
        }

        if horizon.is_empty() {
            return Err(Error::InternalInconsistency { invariant: "eye vertex has no visible horizon" });
        }

        // Reorder into a single CCW cycle: horizon[i+1].tail must equal
        // horizon[i].twin.tail.
        let n = horizon.len();
        for i in 0..n.saturating_sub(1) {
            let want = self.edges.get(self.edges.get(horizon[i].0).twin.unwrap().0).tail;
            let mut found = None;
            for j in (i + 1)..n {
                if self.edges.get(horizon[j].0).tail == want {
                    found = Some(j);
                    break;
                }
            }
            match found {
                Some(j) => horizon.swap(i + 1, j),
                None => {
                    return Err(Error::InternalInconsistency {
                        invariant: "visible region is not simply connected; horizon is not a single cycle",
                    });
                }
            }
        }
        let last_twin_tail = self.edges.get(self.edges.get(horizon[n - 1].0).twin.unwrap().0).tail;
        if last_twin_tail != self.edges.get(horizon[0].0).tail {
            return Err(Error::InternalInconsistency {
                invariant: "horizon does not close into a cycle",
            });
        }

        Ok(horizon)
    }

    fn add_new_faces(&mut self, eye: VertexId, horizon: &[HalfEdgeId]) -> Result<Vec<FaceId>> {
        let mut new_faces = Vec::with_capacity(horizon.len());
        let mut fan_pairs: HashMap<(u32, u32), HalfEdgeId> = HashMap::new();

        for &old_edge_id in horizon {
            let old_edge = *self.edges.get(old_edge_id.0);
            let v2 = old_edge.tail;
            let old_twin_id = old_edge.twin.expect("horizon edge must have a twin");
            let v3 = self.edges.get(old_twin_id.0).tail;

            let plane = Plane::from_points(
                self.vertices.get(eye.0).position,
                self.vertices.get(v2.0).position,
                self.vertices.get(v3.0).position,
            );
            let center = centroid(&[
                self.vertices.get(eye.0).position,
                self.vertices.get(v2.0).position,
                self.vertices.get(v3.0).position,
            ]);
            let face_idx = self.faces.alloc(Face {
                edge: HalfEdgeId(0),
                plane,
                center,
                state: FaceState::Invisible,
                conflict: Vec::new(),
            });
            let face = FaceId(face_idx);

            let e_eye_v2 = HalfEdgeId(self.edges.alloc(HalfEdge { tail: eye, twin: None, next: None, prev: None, face }));
            let e_v2_v3 = HalfEdgeId(self.edges.alloc(HalfEdge { tail: v2, twin: Some(old_twin_id), next: None, prev: None, face }));
            let e_v3_eye = HalfEdgeId(self.edges.alloc(HalfEdge { tail: v3, twin: None, next: None, prev: None, face }));

            {
                let e0 = self.edges.get_mut(e_eye_v2.0);
                e0.next = Some(e_v2_v3);
                e0.prev = Some(e_v3_eye);
            }
            {
                let e1 = self.edges.get_mut(e_v2_v3.0);
                e1.next = Some(e_v3_eye);
                e1.prev = Some(e_eye_v2);
            }
            {
                let e2 = self.edges.get_mut(e_v3_eye.0);
                e2.next = Some(e_eye_v2);
                e2.prev = Some(e_v2_v3);
            }
            self.faces.get_mut(face.0).edge = e_eye_v2;
            self.edges.get_mut(old_twin_id.0).twin = Some(e_v2_v3);

            for &(key, edge_id) in &[((eye.0, v2.0), e_eye_v2), ((v3.0, eye.0), e_v3_eye)] {
                let opposite = (key.1, key.0);
                if let Some(&twin_id) = fan_pairs.get(&opposite) {
                    self.edges.get_mut(edge_id.0).twin = Some(twin_id);
                    self.edges.get_mut(twin_id.0).twin = Some(edge_id);
                } else {
                    fan_pairs.insert(key, edge_id);
                }
            }

            new_faces.push(face);
        }

        // Reassign orphaned conflict points from the faces about to be
        // torn down to whichever new face now sees them.
        let visible_faces: Vec<FaceId> = self
            .faces
            .iter_live()
            .filter(|(_, f)| f.state == FaceState::Visible)
            .map(|(i, _)| FaceId(i))
            .collect();

        let mut orphans = Vec::new();
        for &vf in &visible_faces {
            orphans.append(&mut self.faces.get_mut(vf.0).conflict);
        }
        for orphan in orphans {
            let pos = self.vertices.get(orphan.0).position;
            let mut best: Option<(FaceId, f32)> = None;
            for &nf in &new_faces {
                let d = self.faces.get(nf.0).plane.distance(pos);
                if d > self.tolerance {
                    let better = best.map(|(_, bd)| d > bd).unwrap_or(true);
                    if better {
                        best = Some((nf, d));
                    }
                }
            }
            match best {
                Some((nf, _)) => {
                    self.vertices.get_mut(orphan.0).conflict_face = Some(nf);
                    self.faces.get_mut(nf.0).conflict.push(orphan);
                }
                None => {
                    self.vertices.free(orphan.0);
                }
            }
        }

        for &vf in &visible_faces {
            let start = self.faces.get(vf.0).edge;
            let mut cur = start;
            let mut to_free = Vec::new();
            loop {
                let e = *self.edges.get(cur.0);
                to_free.push(cur);
                cur = e.next.expect("live edge must have next");
                if cur == start {
                    break;
                }
            }
            for e in to_free {
                self.edges.free(e.0);
            }
            self.faces.free(vf.0);
        }

        Ok(new_faces)
    }

    fn merge_fixed_point(&mut self, face: FaceId) -> Result<()> {
        while self.faces.is_live(face.0) && self.merge_face_once(face)? {}
        Ok(())
    }

    fn merge_face_once(&mut self, face: FaceId) -> Result<bool> {
        let start = self.faces.get(face.0).edge;
        let mut cur = start;
        loop {
            let e = *self.edges.get(cur.0);
            let twin = e.twin.expect("live edge must have twin");
            let other_face = self.edges.get(twin.0).face;
            if other_face != face {
                let d1 = self.faces.get(face.0).plane.distance(self.faces.get(other_face.0).center);
                let d2 = self.faces.get(other_face.0).plane.distance(self.faces.get(face.0).center);
                if !(d1 < -self.tolerance && d2 < -self.tolerance) {
                    self.absorb(face, other_face, cur, twin)?;
                    return Ok(true);
                }
            }
            cur = e.next.expect("live edge must have next");
            if cur == start {
                break;
            }
        }
        Ok(false)
    }

    fn absorb(&mut self, f: FaceId, g: FaceId, e: HalfEdgeId, e_twin: HalfEdgeId) -> Result<()> {
        if f == g {
            return Err(Error::InternalInconsistency { invariant: "face cannot absorb itself" });
        }

        let mut transferred = std::mem::take(&mut self.faces.get_mut(g.0).conflict);
        for &v in &transferred {
            self.vertices.get_mut(v.0).conflict_face = Some(f);
        }
        self.faces.get_mut(f.0).conflict.append(&mut transferred);

        // Re-parent every surviving edge of G to F before splicing.
        let mut cur = self.edges.get(e_twin.0).next.expect("live edge must have next");
        while cur != e_twin {
            self.edges.get_mut(cur.0).face = f;
            cur = self.edges.get(cur.0).next.expect("live edge must have next");
        }

        let e_prev = self.edges.get(e.0).prev.expect("live edge must have prev");
        let e_next = self.edges.get(e.0).next.expect("live edge must have next");
        let et_prev = self.edges.get(e_twin.0).prev.expect("live edge must have prev");
        let et_next = self.edges.get(e_twin.0).next.expect("live edge must have next");

        self.edges.get_mut(e_prev.0).next = Some(et_next);
        self.edges.get_mut(et_next.0).prev = Some(e_prev);
        self.edges.get_mut(et_prev.0).next = Some(e_next);
        self.edges.get_mut(e_next.0).prev = Some(et_prev);

        self.faces.get_mut(f.0).edge = e_next;

        self.edges.free(e.0);
        self.edges.free(e_twin.0);
        self.faces.free(g.0);

        self.recompute_face_geometry(f);
        Ok(())
    }

    /// Recomputes a face's plane (via Newell's method, robust to more
    /// than three and near-degenerate boundary vertices) and its
    /// center (centroid of boundary vertex positions).
    fn recompute_face_geometry(&mut self, f: FaceId) {
        let verts = self.face_vertices(f);
        let positions: Vec<Vec3> = verts.iter().map(|&v| self.vertices.get(v.0).position).collect();

        let mut normal = Vec3::zero();
        let n = positions.len();
        for i in 0..n {
            let cur = positions[i];
            let next = positions[(i + 1) % n];
            normal = normal
                + Vec3::new(
                    (cur.y - next.y) * (cur.z + next.z),
                    (cur.z - next.z) * (cur.x + next.x),
                    (cur.x - next.x) * (cur.y + next.y),
                );
        }
        let normal = normal.normalize();
        let center = centroid(&positions);
        let d = normal.dot(center);

        let face = self.faces.get_mut(f.0);
        face.plane = Plane::new(normal, d);
        face.center = center;
    }
}

fn centroid(points: &[Vec3]) -> Vec3 {
    let sum = points.iter().fold(Vec3::zero(), |acc, &p| acc + p);
    sum.scale(1.0 / points.len() as f32)
}

/// `3 * (|max.x| + |max.y| + |max.z|) * EPSILON`, absolute-scaled to
/// the cloud's extent so it behaves like a relative tolerance for
/// nearly-uniform inputs.
fn compute_tolerance(points: &[Vec3]) -> f32 {
    let mut max = Vec3::zero();
    for p in points {
        max.x = max.x.max(p.x.abs());
        max.y = max.y.max(p.y.abs());
        max.z = max.z.max(p.z.abs());
    }
    3.0 * (max.x + max.y + max.z) * f32::EPSILON
}

fn euler_edge_bound(vertex_count: usize) -> usize {
    (3 * vertex_count).saturating_sub(6).max(12) * 2
}

fn euler_face_bound(vertex_count: usize) -> usize {
    (2 * vertex_count).saturating_sub(4).max(8) * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_corners() -> Vec<Vec3> {
        let mut pts = Vec::new();
        for &x in &[0.0, 1.0] {
            for &y in &[0.0, 1.0] {
                for &z in &[0.0, 1.0] {
                    pts.push(Vec3::new(x, y, z));
                }
            }
        }
        pts
    }

    #[test]
    fn tetrahedron_has_four_triangular_faces() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let hull = Hull::construct(&pts, &HullConfig::default()).unwrap();
        assert_eq!(hull.face_count(), 4);
        for f in hull.face_ids() {
            assert_eq!(hull.face_vertices(f).len(), 3);
        }
    }

    #[test]
    fn cube_faces_merge_to_six() {
        let pts = cube_corners();
        let hull = Hull::construct(&pts, &HullConfig::default()).unwrap();
        assert_eq!(hull.face_count(), 6);
    }

    #[test]
    fn interior_point_is_rejected() {
        let mut pts = cube_corners();
        pts.push(Vec3::new(0.5, 0.5, 0.5));
        let hull = Hull::construct(&pts, &HullConfig::default()).unwrap();
        assert_eq!(hull.face_count(), 6);
        for f in hull.face_ids() {
            for v in hull.face_vertices(f) {
                assert_ne!(hull.vertex_position(v), Vec3::new(0.5, 0.5, 0.5));
            }
        }
    }

    #[test]
    fn fewer_than_four_points_is_degenerate() {
        let pts = vec![Vec3::zero(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        assert!(matches!(Hull::construct(&pts, &HullConfig::default()), Err(Error::DegenerateInput { .. })));
    }

    #[test]
    fn coplanar_input_is_degenerate() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        assert!(matches!(Hull::construct(&pts, &HullConfig::default()), Err(Error::DegenerateInput { .. })));
    }

    #[test]
    fn every_face_plane_passes_near_its_vertices() {
        let pts = cube_corners();
        let hull = Hull::construct(&pts, &HullConfig::default()).unwrap();
        for f in hull.face_ids() {
            let plane = hull.face_plane(f);
            for v in hull.face_vertices(f) {
                let d = plane.distance(hull.vertex_position(v)).abs();
                assert!(d <= hull.tolerance() * 4.0, "face vertex off-plane by {d}");
            }
        }
    }

    #[test]
    fn convexity_holds_between_all_face_pairs() {
        let pts = cube_corners();
        let hull = Hull::construct(&pts, &HullConfig::default()).unwrap();
        let faces: Vec<FaceId> = hull.face_ids().collect();
        for &f in &faces {
            for &g in &faces {
                if f == g {
                    continue;
                }
                let d = hull.face_plane(f).distance(hull.face_center(g));
                assert!(d <= hull.tolerance() * 4.0, "face {:?} sees center of {:?} at {d}", f, g);
            }
        }
    }

    #[test]
    fn hull_is_idempotent_on_its_own_vertex_set() {
        let pts = cube_corners();
        let hull1 = Hull::construct(&pts, &HullConfig::default()).unwrap();
        let vertex_set: Vec<Vec3> = hull1
            .face_ids()
            .flat_map(|f| hull1.face_vertices(f))
            .map(|v| hull1.vertex_position(v))
            .collect();
        let mut dedup = Vec::new();
        for p in vertex_set {
            if !dedup.iter().any(|&q: &Vec3| q == p) {
                dedup.push(p);
            }
        }
        let hull2 = Hull::construct(&dedup, &HullConfig::default()).unwrap();
        assert_eq!(hull1.face_count(), hull2.face_count());
    }
}
