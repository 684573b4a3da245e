use invert_core::Observer;
use tracing::{debug, info};

use crate::traits::{HasIteration, HasObjective};

/// Logs every solver event through `tracing`.
///
/// The construction event and accepted steps are logged at `info` level by
/// default; use [`Logger::quiet`] to log them at `debug` instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    quiet: bool,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs at `debug` level.
    #[must_use]
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl<E, A> Observer<E, A> for Logger
where
    E: HasObjective + HasIteration,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let iteration = event.iteration();
        let objective = event.objective();
        match (event.step_length(), self.quiet) {
            (None, false) => info!(iteration, objective, "initial iterate"),
            (None, true) => debug!(iteration, objective, "initial iterate"),
            (Some(step), false) => info!(iteration, objective, step, "accepted step"),
            (Some(step), true) => debug!(iteration, objective, step, "accepted step"),
        }
        None
    }
}
