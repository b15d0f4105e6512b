//! Crate-wide error kinds for the hull and cloth cores.

use thiserror::Error;

/// Failure modes surfaced by the convex hull builder and the cloth solver.
///
/// `non_convergent` PCG outcomes are not represented here: the solver
/// contract treats an exhausted iteration budget as a successful call
/// that returns its best iterate, not an error (see `pcg::Outcome`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: &'static str },

    #[error("internal inconsistency: {invariant}")]
    InternalInconsistency { invariant: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
