use invert_core::{Field, ForwardModel, Functional};

use crate::line_search;

use super::{Context, Error, SolverState};

/// Computes the direction along which an inverse solver searches for a better parameter.
///
/// The solver calls [`SearchDirection::search_direction`] after construction
/// and after every step, once the state, adjoint state, and gradient of
/// `state` are consistent with its parameter.
pub trait SearchDirection {
    /// Line search settings this strategy prefers, if any.
    fn line_search_config(&self) -> Option<line_search::Config> {
        None
    }

    /// Computes a descent direction `q` for the iterate `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if a model evaluation or linear solve fails.
    fn search_direction<M, E, R>(
        &mut self,
        ctx: &Context<'_, M, E, R>,
        state: &SolverState,
    ) -> Result<Field, Error>
    where
        M: ForwardModel,
        E: Functional,
        R: Functional;
}
