use invert_core::Field;

/// The evolving iterate of an inverse solver.
///
/// The state is consistent with the parameter, the adjoint state and gradient
/// are consistent with both, and the search direction is consistent with the
/// gradient. Solvers only replace a state as a whole once every member has
/// been recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState {
    pub(super) parameter: Field,
    pub(super) state: Field,
    pub(super) adjoint: Field,
    pub(super) gradient: Field,
    pub(super) search_direction: Field,
}

impl SolverState {
    pub(super) fn new(parameter: Field, state: Field) -> Self {
        let (n, m) = (state.len(), parameter.len());
        Self {
            parameter,
            state,
            adjoint: Field::zeros(n),
            gradient: Field::zeros(m),
            search_direction: Field::zeros(m),
        }
    }

    /// The current parameter `p`.
    #[must_use]
    pub fn parameter(&self) -> &Field {
        &self.parameter
    }

    /// The state `u` solved from the current parameter.
    #[must_use]
    pub fn state(&self) -> &Field {
        &self.state
    }

    /// The adjoint state `λ`.
    #[must_use]
    pub fn adjoint(&self) -> &Field {
        &self.adjoint
    }

    /// The gradient `dJ = (dF/dp)ᵀ λ + dR`, assembled as a covector.
    #[must_use]
    pub fn gradient(&self) -> &Field {
        &self.gradient
    }

    /// The direction along which the next line search runs.
    #[must_use]
    pub fn search_direction(&self) -> &Field {
        &self.search_direction
    }
}
