use thiserror::Error;

use super::ConfigError;

/// Errors that can occur during a linear solve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid solver parameters: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("{rows}x{cols} matrix does not match right-hand side of length {rhs}")]
    DimensionMismatch { rows: usize, cols: usize, rhs: usize },

    #[error("matrix is singular")]
    Singular,

    #[error("Dirichlet dof {dof} is out of range for {len} unknowns")]
    InvalidDof { dof: usize, len: usize },

    #[error("conjugate gradients did not converge in {iters} iterations (residual {residual:e})")]
    NotConverged { iters: usize, residual: f64 },

    #[error("conjugate gradients broke down: matrix is not positive definite")]
    Breakdown,
}
