//! Vectors, matrices, planes, and rigid transforms.
//!
//! Every operation here is a pure function of its inputs: no shared state,
//! no allocation, single-precision throughout to match the numerical
//! character of the two cores built on top of it. Callers are responsible
//! for keeping NaN/Inf out; nothing in this module sanitizes its inputs.

use std::ops::{Add, Index, Mul, Neg, Sub};

/// A point or direction in 3-space.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub const fn zero() -> Self {
        Vec3::new(0.0, 0.0, 0.0)
    }

    pub fn splat(v: f32) -> Self {
        Vec3::new(v, v, v)
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns the zero vector for a zero-length input rather than NaN.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            self.scale(1.0 / len)
        } else {
            Vec3::zero()
        }
    }

    pub fn scale(self, f: f32) -> Vec3 {
        Vec3::new(self.x * f, self.y * f, self.z * f)
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance_squared(self, other: Vec3) -> f32 {
        (self - other).length_squared()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Outer product `self * other^T`, used to build spring Jacobian blocks.
    pub fn outer(self, other: Vec3) -> Mat33 {
        Mat33::from_rows(
            [self.x * other.x, self.x * other.y, self.x * other.z],
            [self.y * other.x, self.y * other.y, self.y * other.z],
            [self.z * other.x, self.z * other.y, self.z * other.z],
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, f: f32) -> Vec3 {
        self.scale(f)
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {i}"),
        }
    }
}

/// Row-major 3x3 matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat33 {
    pub rows: [[f32; 3]; 3],
}

impl Mat33 {
    pub const fn from_rows(r0: [f32; 3], r1: [f32; 3], r2: [f32; 3]) -> Self {
        Mat33 { rows: [r0, r1, r2] }
    }

    pub const fn zero() -> Self {
        Mat33::from_rows([0.0; 3], [0.0; 3], [0.0; 3])
    }

    pub const fn identity() -> Self {
        Mat33::from_rows([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0])
    }

    pub fn diagonal(d: f32) -> Self {
        Mat33::from_rows([d, 0.0, 0.0], [0.0, d, 0.0], [0.0, 0.0, d])
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.rows[r][c]
    }

    pub fn transpose(&self) -> Mat33 {
        let m = &self.rows;
        Mat33::from_rows(
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        )
    }

    pub fn mul_vec3(&self, v: Vec3) -> Vec3 {
        let m = &self.rows;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    pub fn mul_mat(&self, other: &Mat33) -> Mat33 {
        let mut out = Mat33::zero();
        for r in 0..3 {
            for c in 0..3 {
                let mut acc = 0.0;
                for k in 0..3 {
                    acc += self.rows[r][k] * other.rows[k][c];
                }
                out.rows[r][c] = acc;
            }
        }
        out
    }

    pub fn add(&self, other: &Mat33) -> Mat33 {
        let mut out = Mat33::zero();
        for r in 0..3 {
            for c in 0..3 {
                out.rows[r][c] = self.rows[r][c] + other.rows[r][c];
            }
        }
        out
    }

    pub fn sub(&self, other: &Mat33) -> Mat33 {
        let mut out = Mat33::zero();
        for r in 0..3 {
            for c in 0..3 {
                out.rows[r][c] = self.rows[r][c] - other.rows[r][c];
            }
        }
        out
    }

    pub fn scale(&self, f: f32) -> Mat33 {
        let mut out = Mat33::zero();
        for r in 0..3 {
            for c in 0..3 {
                out.rows[r][c] = self.rows[r][c] * f;
            }
        }
        out
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.rows;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Returns `None` when the matrix is singular to working precision;
    /// callers fall back to a zero preconditioner block in that case.
    pub fn inverse(&self) -> Option<Mat33> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }
        let m = &self.rows;
        let inv_det = 1.0 / det;
        let cofactor = |r0c0: f32, r0c1: f32, r1c0: f32, r1c1: f32| r0c0 * r1c1 - r0c1 * r1c0;
        let adj = Mat33::from_rows(
            [
                cofactor(m[1][1], m[1][2], m[2][1], m[2][2]),
                -cofactor(m[0][1], m[0][2], m[2][1], m[2][2]),
                cofactor(m[0][1], m[0][2], m[1][1], m[1][2]),
            ],
            [
                -cofactor(m[1][0], m[1][2], m[2][0], m[2][2]),
                cofactor(m[0][0], m[0][2], m[2][0], m[2][2]),
                -cofactor(m[0][0], m[0][2], m[1][0], m[1][2]),
            ],
            [
                cofactor(m[1][0], m[1][1], m[2][0], m[2][1]),
                -cofactor(m[0][0], m[0][1], m[2][0], m[2][1]),
                cofactor(m[0][0], m[0][1], m[1][0], m[1][1]),
            ],
        )
        .transpose();
        Some(adj.scale(inv_det))
    }

    pub fn is_finite(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(|x| x.is_finite()))
    }
}

impl Default for Mat33 {
    fn default() -> Self {
        Mat33::zero()
    }
}

/// Column-major 4x4 homogeneous transform matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat44 {
    pub cols: [[f32; 4]; 4],
}

impl Mat44 {
    pub const fn identity() -> Self {
        Mat44 {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn from_rotation_translation(r: &Mat33, t: Vec3) -> Self {
        let mut out = Mat44::identity();
        for c in 0..3 {
            for row in 0..3 {
                out.cols[c][row] = r.rows[row][c];
            }
        }
        out.cols[3] = [t.x, t.y, t.z, 1.0];
        out
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0],
            c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1],
            c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2],
        )
    }
}

impl Default for Mat44 {
    fn default() -> Self {
        Mat44::identity()
    }
}

/// Unit quaternion representing a rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const fn identity() -> Self {
        Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }

    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half = angle * 0.5;
        let s = half.sin();
        let a = axis.normalize();
        Quat { x: a.x * s, y: a.y * s, z: a.z * s, w: half.cos() }
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    pub fn normalize(&self) -> Quat {
        let len = self.length_squared().sqrt();
        if len > 0.0 {
            let inv = 1.0 / len;
            Quat { x: self.x * inv, y: self.y * inv, z: self.z * inv, w: self.w * inv }
        } else {
            Quat::identity()
        }
    }

    pub fn to_mat33(&self) -> Mat33 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        Mat33::from_rows(
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
            ],
            [
                2.0 * (x * y + z * w),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                1.0 - 2.0 * (x * x + y * y),
            ],
        )
    }
}

impl Default for Quat {
    fn default() -> Self {
        Quat::identity()
    }
}

/// Plane stored as a unit normal and signed offset: points `p` on the
/// plane satisfy `dot(normal, p) == d`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Plane { normal, d }
    }

    /// Builds the plane through `a, b, c` with normal `normalize(cross(b-a, c-a))`.
    /// Winding order is the caller's responsibility.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize();
        let d = normal.dot(a);
        Plane { normal, d }
    }

    /// Signed distance `dot(normal, p) - d`; positive is the side the
    /// normal points toward.
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.d
    }
}

/// A rigid rotation plus translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Transform {
    pub const fn identity() -> Self {
        Transform { rotation: Quat::identity(), translation: Vec3::zero() }
    }

    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Transform { rotation, translation }
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.rotation.to_mat33().mul_vec3(p) + self.translation
    }

    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.to_mat33().mul_vec3(v)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_normalize_zero_is_zero() {
        assert_eq!(Vec3::zero().normalize(), Vec3::zero());
    }

    #[test]
    fn vec3_cross_orthogonal() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(y);
        assert!((z.x - 0.0).abs() < 1e-6);
        assert!((z.y - 0.0).abs() < 1e-6);
        assert!((z.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mat33_identity_inverse_is_identity() {
        let inv = Mat33::identity().inverse().unwrap();
        assert_eq!(inv, Mat33::identity());
    }

    #[test]
    fn mat33_singular_inverse_is_none() {
        assert!(Mat33::zero().inverse().is_none());
    }

    #[test]
    fn mat33_inverse_round_trip() {
        let m = Mat33::from_rows([2.0, 0.0, 1.0], [0.0, 3.0, 0.0], [1.0, 0.0, 2.0]);
        let inv = m.inverse().unwrap();
        let id = m.mul_mat(&inv);
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((id.rows[r][c] - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn plane_from_points_contains_its_points() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        let plane = Plane::from_points(a, b, c);
        assert!(plane.distance(a).abs() < 1e-6);
        assert!(plane.distance(b).abs() < 1e-6);
        assert!(plane.distance(c).abs() < 1e-6);
    }

    #[test]
    fn quat_from_axis_angle_rotates_correctly() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::FRAC_PI_2);
        let p = q.to_mat33().mul_vec3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transform_identity_is_noop() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Transform::identity().apply_point(p), p);
    }
}
