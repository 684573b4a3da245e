use invert_core::{Field, ForwardModel, Functional, InverseProblem};
use tracing::trace;

use super::{Context, Error, InverseSolver, SearchDirection, SolverState};

/// Searches along the mass-preconditioned negative gradient.
///
/// The direction `q` solves `M q = −dJ`, where `M` is the mass matrix of the
/// parameter space. It is cheap to compute but often poorly scaled, which
/// makes the line search work harder than with [`GaussNewton`](super::GaussNewton).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradientDescent;

impl SearchDirection for GradientDescent {
    fn search_direction<M, E, R>(
        &mut self,
        ctx: &Context<'_, M, E, R>,
        state: &SolverState,
    ) -> Result<Field, Error>
    where
        M: ForwardModel,
        E: Functional,
        R: Functional,
    {
        let mass = ctx.mass(state.state(), state.parameter())?;
        let direction = ctx.solve(&mass, &(-state.gradient()), false)?;
        trace!(norm = direction.norm(), "gradient descent direction");
        Ok(direction)
    }
}

/// An inverse solver that searches along the gradient.
pub type GradientDescentSolver<'p, M, E, R, Obs = ()> = InverseSolver<'p, M, E, R, GradientDescent, Obs>;

impl<'p, M, E, R> InverseSolver<'p, M, E, R, GradientDescent, ()>
where
    M: ForwardModel,
    E: Functional,
    R: Functional,
{
    /// Creates an unobserved gradient-descent solver with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state, adjoint state, or search
    /// direction cannot be computed.
    pub fn gradient_descent(problem: &'p InverseProblem<M, E, R>) -> Result<Self, Error> {
        Self::new(problem, GradientDescent, ())
    }
}
