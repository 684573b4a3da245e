//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, so an
//! observer written once can watch any solver that implements them.
//!
//! # Event traits
//!
//! - [`HasObjective`] — events that carry an objective value
//! - [`HasIteration`] — events that know which iteration they belong to
//!
//! # Action traits
//!
//! - [`CanStopEarly`] — actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use invert_core::Observer;
//! use invert_observers::traits::{CanStopEarly, HasIteration};
//!
//! struct AtMost(usize);
//!
//! impl<E: HasIteration, A: CanStopEarly> Observer<E, A> for AtMost {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.iteration() >= self.0).then(A::stop_early)
//!     }
//! }
//! ```

use invert_solvers::inverse;

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective for this event.
    fn objective(&self) -> f64;
}

/// An event emitted at a known iteration.
pub trait HasIteration {
    /// Returns the number of iterations completed when the event fired.
    fn iteration(&self) -> usize;

    /// Returns the length of the step that produced this event, if any.
    fn step_length(&self) -> Option<f64> {
        None
    }
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

// --- inverse::Event ---

impl HasObjective for inverse::Event<'_> {
    fn objective(&self) -> f64 {
        self.value()
    }
}

impl HasIteration for inverse::Event<'_> {
    fn iteration(&self) -> usize {
        self.iteration
    }

    fn step_length(&self) -> Option<f64> {
        self.step_length
    }
}

// --- inverse::Action ---

impl CanStopEarly for inverse::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
