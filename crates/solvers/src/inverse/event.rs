use super::SolverState;

/// Emitted once after construction and once after every accepted step.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Number of steps taken so far; zero for the construction event.
    pub iteration: usize,

    /// Length of the accepted step, or `None` for the construction event.
    pub step_length: Option<f64>,

    /// Misfit `E(u)` at the current iterate.
    pub objective: f64,

    /// Regularization `R(p)` at the current iterate.
    pub regularization: f64,

    /// The current iterate.
    pub state: &'a SolverState,
}

impl Event<'_> {
    /// The objective `J = E(u) + R(p)`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.objective + self.regularization
    }
}
