use invert_core::Observer;

use crate::traits::{CanStopEarly, HasObjective};

/// Stops the solver once the objective drops to or below a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopBelow(pub f64);

impl<E, A> Observer<E, A> for StopBelow
where
    E: HasObjective,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.objective() <= self.0).then(A::stop_early)
    }
}
