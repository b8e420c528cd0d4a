use thiserror::Error;

/// Errors that abort a solve.
///
/// Convergence outcomes are never reported here, see [`crate::ExitFlag`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptError {
    /// The initial design vector has no elements.
    #[error("design vector must not be empty")]
    EmptyDesignVector,

    /// Vectors that must agree in length do not.
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// An objective, constraint or gradient evaluation was NaN or infinite.
    #[error("non-finite value from {what}")]
    NonFiniteValue { what: &'static str },

    /// The curvature condition `dx'*dg > 0` failed for a Hessian update.
    #[error("ill-conditioned Hessian update (curvature {curvature:e})")]
    IllConditionedUpdate { curvature: f64 },

    /// A solver option is out of range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, OptError>;
