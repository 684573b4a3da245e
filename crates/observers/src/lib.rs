//! Reusable observers for the invert inverse solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with any solver whose events report an objective and an iteration.
//!
//! # Modules
//!
//! - [`traits`] — Capability traits for cross-solver observers
//!   ([`HasObjective`], [`HasIteration`], [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`Logger`] — emits one `tracing` event per solver event
//! - [`History`] — records the objective after every step
//! - [`StopBelow`] — stops the solver once the objective is small enough
//!
//! [`Observer`]: invert_core::Observer
//! [`HasObjective`]: traits::HasObjective
//! [`HasIteration`]: traits::HasIteration
//! [`CanStopEarly`]: traits::CanStopEarly

mod history;
mod logger;
mod stop;
pub mod traits;

pub use history::{History, Record};
pub use logger::Logger;
pub use stop::StopBelow;
