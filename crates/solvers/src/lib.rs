//! Solvers for adjoint-based inverse problems.
//!
//! - [`inverse`] — the [`InverseSolver`](inverse::InverseSolver) and its
//!   search-direction strategies ([`GradientDescent`](inverse::GradientDescent),
//!   [`GaussNewton`](inverse::GaussNewton))
//! - [`line_search`] — bracketing and golden section search along a direction
//! - [`linear`] — direct and iterative solves of linear systems with
//!   homogeneous Dirichlet conditions

pub mod inverse;
pub mod line_search;
pub mod linear;
