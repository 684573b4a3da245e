/// Why [`InverseSolver::solve`](super::InverseSolver::solve) stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The objective fell to or below the absolute threshold.
    BelowThreshold,

    /// A step improved the objective by less than the relative tolerance.
    Stalled,

    /// The iteration limit was reached.
    MaxIterations,

    /// An observer requested an early stop.
    StoppedByObserver,
}

/// The result of [`InverseSolver::solve`](super::InverseSolver::solve).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Why the solver stopped.
    pub status: Status,

    /// Number of steps taken by this call.
    pub iterations: usize,

    /// Objective `J = E(u) + R(p)` at the final iterate.
    pub objective: f64,
}
