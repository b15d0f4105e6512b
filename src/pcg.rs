//! Filtered (modified) preconditioned conjugate gradient: solves
//! `S*A*x = S*b` for `x` in the subspace the constraint filter `S`
//! leaves free, starting from the offset `z` rather than zero so that
//! pinned and contact-clamped nodes land on their prescribed velocity
//! rather than being solved for.

use tracing::trace;

use crate::error::{Error, Result};
use crate::geom::Mat33;
use crate::sparse::{DenseVec3, DiagMat33, SparseMat33};

/// Result of a [`solve`] call.
pub struct Outcome {
    pub delta_v: DenseVec3,
    pub iterations: usize,
    pub converged: bool,
}

fn filter(s: &DiagMat33, v: &DenseVec3) -> DenseVec3 {
    s.mul_dense(v)
}

/// Jacobi preconditioner built from `a`'s diagonal blocks, inverted
/// per-block; singular blocks (fully constrained nodes) invert to zero.
fn jacobi_preconditioner(a: &SparseMat33) -> Result<DiagMat33> {
    let diag = a.assemble_diagonal()?;
    Ok(diag.inverse())
}

fn apply_diag(p: &DiagMat33, v: &DenseVec3) -> DenseVec3 {
    p.mul_dense(v)
}

/// Solves `S*A*Δv = S*b` for `Δv`, starting from `Δv = z`.
///
/// Filtering is applied inside every inner product and matrix-vector
/// product, not just at the boundary, so the iteration stays symmetric
/// on the constrained subspace: an unfiltered residual would let the
/// solver drift off the feasible set on every step.
pub fn solve(
    a: &SparseMat33,
    b: &DenseVec3,
    s: &DiagMat33,
    z: &DenseVec3,
    tolerance: f32,
    max_iter: usize,
) -> Result<Outcome> {
    if a.num_rows() != a.num_cols() {
        return Err(Error::InternalInconsistency { invariant: "pcg requires a square system matrix" });
    }
    let n = a.num_rows();
    if b.len() != n || s.len() != n || z.len() != n {
        return Err(Error::InternalInconsistency { invariant: "pcg operands must share the system's dimension" });
    }

    let precond = jacobi_preconditioner(a)?;

    let mut delta_v = z.clone();
    let b_filtered = filter(s, b);
    let stop = tolerance * tolerance * b_filtered.dot(&b_filtered);

    let a_dv = a.multiply(&delta_v)?;
    let mut r = filter(s, &b.sub(&a_dv));
    let mut c = filter(s, &apply_diag(&precond, &r));
    let mut delta_new = r.dot(&c);

    if delta_new <= stop || n == 0 {
        return Ok(Outcome { delta_v, iterations: 0, converged: true });
    }

    let mut iterations = 0usize;
    let mut converged = false;

    while iterations < max_iter {
        let q = filter(s, &a.multiply(&c)?);
        let denom = c.dot(&q);
        if denom.abs() <= f32::EPSILON {
            break;
        }
        let alpha = delta_new / denom;
        delta_v = delta_v.axpy(alpha, &c);
        r = r.sub(&q.scale(alpha));

        let residual_norm = r.dot(&r);
        iterations += 1;
        trace!(iterations, residual_norm, stop, "pcg iteration");
        if residual_norm <= stop {
            converged = true;
            break;
        }

        let precond_r = apply_diag(&precond, &r);
        let delta_old = delta_new;
        delta_new = r.dot(&precond_r);
        let beta = delta_new / delta_old;
        c = filter(s, &precond_r.axpy(beta, &c));
    }

    Ok(Outcome { delta_v, iterations, converged })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use crate::sparse::SparseMat33Builder;

    fn identity_system(n: usize) -> SparseMat33 {
        let mut builder = SparseMat33Builder::new(n, n);
        for i in 0..n {
            builder.add_block(i, i, Mat33::identity());
        }
        builder.build()
    }

    #[test]
    fn solves_identity_system_in_one_iteration() {
        let a = identity_system(2);
        let b = DenseVec3::from_vec(vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 2.0)]);
        let s = DiagMat33::from_blocks(vec![Mat33::identity(); 2]);
        let z = DenseVec3::zeros(2);
        let outcome = solve(&a, &b, &s, &z, 1e-6, 30).unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations <= 1);
        for i in 0..2 {
            assert!((outcome.delta_v.as_slice()[i] - b.as_slice()[i]).length() < 1e-4);
        }
    }

    #[test]
    fn fully_constrained_node_stays_at_offset() {
        let a = identity_system(1);
        let b = DenseVec3::from_vec(vec![Vec3::new(5.0, 5.0, 5.0)]);
        let s = DiagMat33::from_blocks(vec![Mat33::zero()]);
        let z = DenseVec3::from_vec(vec![Vec3::new(1.0, 2.0, 3.0)]);
        let outcome = solve(&a, &b, &s, &z, 1e-4, 30).unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.delta_v.as_slice()[0], Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn reports_non_convergence_without_erroring_when_iterations_exhausted() {
        let mut builder = SparseMat33Builder::new(2, 2);
        builder.add_block(0, 0, Mat33::diagonal(1.0));
        builder.add_block(0, 1, Mat33::diagonal(0.9));
        builder.add_block(1, 0, Mat33::diagonal(0.9));
        builder.add_block(1, 1, Mat33::diagonal(1.0));
        let a = builder.build();
        let b = DenseVec3::from_vec(vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]);
        let s = DiagMat33::from_blocks(vec![Mat33::identity(); 2]);
        let z = DenseVec3::zeros(2);
        let outcome = solve(&a, &b, &s, &z, 1e-9, 0).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }
}
