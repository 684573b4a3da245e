use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::{Arg, Arguments, Field, ForwardModel, Functional, Method};

/// Errors that can occur when specifying an inverse problem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    #[error("argument names must not be empty")]
    EmptyName,

    #[error("state and parameter are both named `{name}`")]
    DuplicateName { name: String },

    #[error("model argument `{name}` collides with the state or parameter name")]
    ReservedName { name: String },
}

/// Specifies an inverse problem.
///
/// An inverse problem estimates a parameter `p` from observations of a state
/// `u`, where the two are linked by the physics of a [`ForwardModel`]. The
/// problem consists of the model and the method used to solve it, a misfit
/// functional of the state, a regularization functional of the parameter,
/// the initial state and parameter, and auxiliary data such as extra model
/// arguments and Dirichlet boundary ids.
///
/// The problem only says *what* to solve. Solvers borrow it immutably and
/// copy the initial fields, so one problem can seed any number of solvers.
///
/// The physics are assumed to come from an action principle, i.e. an elliptic
/// system whose residual is the derivative of a scalar functional. Hyperbolic
/// models such as mass transport are not supported.
#[derive(Debug, Clone)]
pub struct InverseProblem<M: ForwardModel, E, R> {
    model: M,
    method: Method<M>,
    objective: E,
    regularization: R,
    state_name: String,
    state: Field,
    parameter_name: String,
    parameter: Field,
    model_args: BTreeMap<String, Arg>,
    dirichlet_ids: BTreeSet<usize>,
}

impl<M, E, R> InverseProblem<M, E, R>
where
    M: ForwardModel,
    E: Functional,
    R: Functional,
{
    /// Creates an inverse problem that solves the model with [`Method::Solve`].
    ///
    /// `objective` is a functional of the state and `regularization` a
    /// functional of the parameter. `state` and `parameter` are bound to the
    /// model under `state_name` and `parameter_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if either name is empty or both names are equal.
    pub fn new(
        model: M,
        objective: E,
        regularization: R,
        (state_name, state): (impl Into<String>, Field),
        (parameter_name, parameter): (impl Into<String>, Field),
    ) -> Result<Self, ProblemError> {
        let state_name = state_name.into();
        let parameter_name = parameter_name.into();

        if state_name.is_empty() || parameter_name.is_empty() {
            return Err(ProblemError::EmptyName);
        }
        if state_name == parameter_name {
            return Err(ProblemError::DuplicateName { name: state_name });
        }

        Ok(Self {
            model,
            method: Method::Solve,
            objective,
            regularization,
            state_name,
            state,
            parameter_name,
            parameter,
            model_args: BTreeMap::new(),
            dirichlet_ids: BTreeSet::new(),
        })
    }
}

impl<M: ForwardModel, E, R> InverseProblem<M, E, R> {
    /// Returns the problem with a different forward-solve method.
    #[must_use]
    pub fn with_method(mut self, method: Method<M>) -> Self {
        self.method = method;
        self
    }

    /// Returns the problem with an extra named model argument.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty or collides with the state or
    /// parameter name.
    pub fn with_model_arg(
        mut self,
        name: impl Into<String>,
        value: impl Into<Arg>,
    ) -> Result<Self, ProblemError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProblemError::EmptyName);
        }
        if name == self.state_name || name == self.parameter_name {
            return Err(ProblemError::ReservedName { name });
        }
        self.model_args.insert(name, value.into());
        Ok(self)
    }

    /// Returns the problem with Dirichlet conditions on the given boundary ids.
    #[must_use]
    pub fn with_dirichlet_ids(mut self, ids: impl IntoIterator<Item = usize>) -> Self {
        self.dirichlet_ids = ids.into_iter().collect();
        self
    }

    /// Binds a state and parameter to the model arguments of this problem.
    ///
    /// The result contains every extra model argument, the Dirichlet boundary
    /// ids, and the two fields under their declared names.
    #[must_use]
    pub fn bind(&self, state: &Field, parameter: &Field) -> Arguments {
        let mut args = Arguments::new().with_dirichlet_ids(self.dirichlet_ids.clone());
        for (name, value) in &self.model_args {
            args.insert(name.clone(), value.clone());
        }
        args.insert(self.state_name.clone(), state.clone());
        args.insert(self.parameter_name.clone(), parameter.clone());
        args
    }

    /// The forward model physics.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The method used to solve the forward model.
    #[must_use]
    pub fn method(&self) -> Method<M> {
        self.method
    }

    /// The misfit functional of the state.
    #[must_use]
    pub fn objective(&self) -> &E {
        &self.objective
    }

    /// The regularization functional of the parameter.
    #[must_use]
    pub fn regularization(&self) -> &R {
        &self.regularization
    }

    /// The name of the state as expected by the model.
    #[must_use]
    pub fn state_name(&self) -> &str {
        &self.state_name
    }

    /// The initial value of the state.
    #[must_use]
    pub fn state(&self) -> &Field {
        &self.state
    }

    /// The name of the parameter as expected by the model.
    #[must_use]
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// The initial value of the parameter.
    #[must_use]
    pub fn parameter(&self) -> &Field {
        &self.parameter
    }

    /// Extra named arguments passed to every model call.
    #[must_use]
    pub fn model_args(&self) -> &BTreeMap<String, Arg> {
        &self.model_args
    }

    /// Boundary ids where Dirichlet conditions are applied.
    #[must_use]
    pub fn dirichlet_ids(&self) -> &BTreeSet<usize> {
        &self.dirichlet_ids
    }
}
