use invert_core::{ForwardModel, InverseProblem};

use crate::{
    line_search,
    linear::{self, DirichletBc, SolverParameters},
};

use super::Error;

/// User-facing options for how an inverse solver performs its inner solves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// How adjoint, tangent-linear, and preconditioner systems are solved.
    pub solver_parameters: SolverParameters,

    /// Line search settings, overriding the search direction's preferred
    /// settings when present.
    pub line_search: Option<line_search::Config>,
}

/// Data derived once from an inverse problem when a solver is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    quadrature_degree: usize,
    bc: DirichletBc,
    solver_parameters: SolverParameters,
    line_search: Option<line_search::Config>,
}

impl Setup {
    pub(super) fn new<M: ForwardModel, E, R>(
        problem: &InverseProblem<M, E, R>,
        solver_parameters: SolverParameters,
        line_search: Option<line_search::Config>,
    ) -> Result<Self, Error> {
        solver_parameters
            .validate()
            .map_err(linear::Error::from)?;
        if let Some(config) = &line_search {
            config.validate().map_err(line_search::Error::from)?;
        }

        let args = problem.bind(problem.state(), problem.parameter());
        let model = problem.model();

        Ok(Self {
            quadrature_degree: model.quadrature_degree(&args),
            bc: DirichletBc::new(model.dirichlet_dofs(&args)),
            solver_parameters,
            line_search,
        })
    }

    /// Quadrature degree chosen by the model for the initial iterate.
    #[must_use]
    pub fn quadrature_degree(&self) -> usize {
        self.quadrature_degree
    }

    /// Homogeneous Dirichlet conditions on the state space.
    #[must_use]
    pub fn dirichlet_bc(&self) -> &DirichletBc {
        &self.bc
    }

    /// Parameters for every linear solve.
    #[must_use]
    pub fn solver_parameters(&self) -> &SolverParameters {
        &self.solver_parameters
    }

    /// Line search settings, if any were configured.
    #[must_use]
    pub fn line_search(&self) -> Option<&line_search::Config> {
        self.line_search.as_ref()
    }
}
