use std::fmt;

use crate::{Arguments, Field, Operator};

/// The result of a forward solve that ran to completion.
///
/// Iterative physics solvers can fail to converge for parameter values far
/// from the current iterate. That is not a programming error: line searches
/// treat a [`Outcome::Diverged`] trial point as infeasible and try a shorter
/// step. Genuine failures (bad arguments, inconsistent sizes) are reported
/// through the model's `Error` type instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The solve converged to the given value.
    Converged(T),

    /// The solve stopped without converging.
    Diverged {
        /// Human-readable description of why the solve stopped.
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Returns true if the solve converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }

    /// Returns the converged value, discarding the divergence reason.
    #[must_use]
    pub fn converged(self) -> Option<T> {
        match self {
            Self::Converged(value) => Some(value),
            Self::Diverged { .. } => None,
        }
    }
}

/// The forward physics of an inverse problem.
///
/// The model solves `F(u, p) = 0` for the state `u` given the parameter `p`,
/// where `F` is the derivative of the model's action with respect to the
/// state. It also assembles the first derivatives of `F` at a given point,
/// which the adjoint and Gauss-Newton computations consume.
///
/// Every method receives the full set of named [`Arguments`]: the state and
/// parameter bound under the names the problem declares, extra model
/// arguments, Dirichlet boundary ids, and (after setup) the quadrature degree.
pub trait ForwardModel {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Solves the forward problem for the state.
    ///
    /// The state bound in `args` is the current iterate and may be used as an
    /// initial guess.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the solve cannot be attempted.
    fn solve(&self, args: &Arguments) -> Result<Outcome<Field>, Self::Error>;

    /// Assembles `dF/du`, the derivative of the residual with respect to the state.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the operator cannot be assembled.
    fn state_jacobian(&self, args: &Arguments) -> Result<Operator, Self::Error>;

    /// Assembles `dF/dp`, the derivative of the residual with respect to the
    /// parameter. Rows index state degrees of freedom, columns index
    /// parameter degrees of freedom.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the operator cannot be assembled.
    fn parameter_jacobian(&self, args: &Arguments) -> Result<Operator, Self::Error>;

    /// Estimates a quadrature degree that integrates the model's forms accurately.
    fn quadrature_degree(&self, _args: &Arguments) -> usize {
        2
    }

    /// Assembles the mass matrix of the parameter space.
    ///
    /// Defaults to the identity, which treats parameter degrees of freedom as
    /// plain Euclidean coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the operator cannot be assembled.
    fn parameter_mass(&self, parameter: &Field, _args: &Arguments) -> Result<Operator, Self::Error> {
        let n = parameter.len();
        Ok(Operator::identity(n, n))
    }

    /// Lists the state degrees of freedom constrained by the Dirichlet ids.
    ///
    /// For vector- or tensor-valued states, every component of a constrained
    /// node must be listed. Defaults to treating each id as a degree of freedom.
    fn dirichlet_dofs(&self, args: &Arguments) -> Vec<usize> {
        args.dirichlet_ids().iter().copied().collect()
    }
}

/// The model method used to perform forward solves.
pub enum Method<M: ForwardModel> {
    /// Use [`ForwardModel::solve`].
    Solve,

    /// Use a custom solve routine, such as a diagnostic solve with different
    /// solver settings.
    Custom(fn(&M, &Arguments) -> Result<Outcome<Field>, M::Error>),
}

impl<M: ForwardModel> Method<M> {
    /// Runs the forward solve.
    ///
    /// # Errors
    ///
    /// Propagates the model's error.
    pub fn call(&self, model: &M, args: &Arguments) -> Result<Outcome<Field>, M::Error> {
        match self {
            Self::Solve => model.solve(args),
            Self::Custom(method) => method(model, args),
        }
    }
}

impl<M: ForwardModel> Clone for Method<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ForwardModel> Copy for Method<M> {}

impl<M: ForwardModel> Default for Method<M> {
    fn default() -> Self {
        Self::Solve
    }
}

impl<M: ForwardModel> fmt::Debug for Method<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solve => f.write_str("Solve"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
