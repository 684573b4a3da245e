/// Actions an observer can request after a solver event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the iteration after the current step.
    StopEarly,
}
