//! Linear solves for adjoint, tangent-linear, and preconditioner systems.
//!
//! Every linear system the inverse solvers need is square and small enough to
//! assemble densely. [`solve`] handles them all, selecting a Krylov method and
//! preconditioner from [`SolverParameters`] in the spirit of PETSc's
//! `ksp_type`/`pc_type` options:
//!
//! - [`Ksp::PreOnly`] with [`Pc::Lu`] — a direct LU solve (the default)
//! - [`Ksp::Cg`] with [`Pc::Jacobi`] or [`Pc::None`] — conjugate gradients for
//!   symmetric positive definite systems
//!
//! Homogeneous Dirichlet conditions are imposed by [`DirichletBc`], which
//! eliminates the constrained degrees of freedom symmetrically so that the
//! solve of `Aᵀ` is the adjoint of the solve of `A`.

mod cg;
mod config;
mod dirichlet;
mod error;

pub use config::{ConfigError, Ksp, Pc, SolverParameters};
pub use dirichlet::DirichletBc;
pub use error::Error;

use invert_core::{Field, Operator};

/// Solves `matrix · x = rhs`, optionally subject to homogeneous Dirichlet conditions.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the dimensions disagree,
/// the matrix is singular, or the iterative method does not converge.
pub fn solve(
    matrix: &Operator,
    rhs: &Field,
    bc: Option<&DirichletBc>,
    params: &SolverParameters,
) -> Result<Field, Error> {
    params.validate()?;

    let n = rhs.len();
    if matrix.nrows() != n || matrix.ncols() != n {
        return Err(Error::DimensionMismatch {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            rhs: n,
        });
    }

    let (matrix, rhs) = match bc {
        Some(bc) => bc.apply(matrix, rhs)?,
        None => (matrix.clone(), rhs.clone()),
    };

    let x = match params.ksp {
        Ksp::PreOnly => matrix.lu().solve(&rhs).ok_or(Error::Singular)?,
        Ksp::Cg => cg::solve(&matrix, &rhs, params)?,
    };

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(Error::Singular)
    }
}
