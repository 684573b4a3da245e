//! Core traits and types for adjoint-based inverse problems.
//!
//! This crate defines the shared abstractions that the inverse solvers and
//! observers build on:
//!
//! - [`Field`] and [`Operator`] — discretized fields and dense linear operators
//! - [`Arguments`] — named fields and scalars bound to a model call
//! - [`ForwardModel`] — the physics that maps a parameter to a state, plus the
//!   linearizations the adjoint machinery needs
//! - [`Functional`] — scalar functionals of a field (misfit, regularization)
//! - [`InverseProblem`] — the immutable description of what to estimate
//! - [`Observer`] — receives solver events and optionally returns control actions

mod arguments;
mod functional;
mod model;
mod observer;
mod problem;

pub use arguments::{Arg, ArgumentError, Arguments};
pub use functional::{Functional, FunctionalError, Misfit, Tikhonov, Zero};
pub use model::{ForwardModel, Method, Outcome};
pub use observer::Observer;
pub use problem::{InverseProblem, ProblemError};

/// A discretized field, stored as one value per degree of freedom.
pub type Field = nalgebra::DVector<f64>;

/// A dense linear operator acting on fields.
pub type Operator = nalgebra::DMatrix<f64>;
