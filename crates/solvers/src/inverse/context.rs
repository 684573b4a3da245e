use invert_core::{Arguments, Field, ForwardModel, Functional, InverseProblem, Operator, Outcome};
use tracing::warn;

use crate::{line_search::Trial, linear};

use super::{Error, Setup};

/// The derivatives of the forward model and functionals at one iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct Linearization {
    /// `dF/du`, square in the state dimension.
    pub state_jacobian: Operator,

    /// `dF/dp`, with state rows and parameter columns.
    pub parameter_jacobian: Operator,

    /// `d²E`, the Hessian of the misfit.
    pub objective_hessian: Operator,

    /// `d²R`, the Hessian of the regularization.
    pub regularization_hessian: Operator,

    /// The mass matrix of the parameter space.
    pub mass: Operator,
}

/// Read-only access to a problem and its setup.
///
/// Search direction strategies receive a context to evaluate the model and
/// perform linear solves without touching the solver's committed state.
#[derive(Debug)]
pub struct Context<'a, M: ForwardModel, E, R> {
    problem: &'a InverseProblem<M, E, R>,
    setup: &'a Setup,
}

impl<M: ForwardModel, E, R> Clone for Context<'_, M, E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ForwardModel, E, R> Copy for Context<'_, M, E, R> {}

impl<'a, M, E, R> Context<'a, M, E, R>
where
    M: ForwardModel,
    E: Functional,
    R: Functional,
{
    pub(super) fn new(problem: &'a InverseProblem<M, E, R>, setup: &'a Setup) -> Self {
        Self { problem, setup }
    }

    /// The problem being solved.
    #[must_use]
    pub fn problem(&self) -> &'a InverseProblem<M, E, R> {
        self.problem
    }

    /// The setup derived from the problem.
    #[must_use]
    pub fn setup(&self) -> &'a Setup {
        self.setup
    }

    /// Binds a state and parameter, with the quadrature degree chosen at setup.
    #[must_use]
    pub fn arguments(&self, state: &Field, parameter: &Field) -> Arguments {
        self.problem
            .bind(state, parameter)
            .with_quadrature_degree(self.setup.quadrature_degree())
    }

    /// Runs the problem's forward-solve method, using `guess` as the initial state.
    ///
    /// # Errors
    ///
    /// Propagates the model's error.
    pub fn forward_solve(&self, guess: &Field, parameter: &Field) -> Result<Outcome<Field>, Error> {
        let args = self.arguments(guess, parameter);
        let outcome = self
            .problem
            .method()
            .call(self.problem.model(), &args)
            .map_err(Error::model)?;

        Ok(match outcome {
            Outcome::Converged(state) if state.iter().all(|v| v.is_finite()) => {
                Outcome::Converged(state)
            }
            Outcome::Converged(_) => Outcome::Diverged {
                reason: "state is not finite".into(),
            },
            diverged @ Outcome::Diverged { .. } => diverged,
        })
    }

    /// Solves for the state consistent with `parameter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForwardDiverged`] if the forward solve does not converge.
    pub fn solve_state(&self, guess: &Field, parameter: &Field) -> Result<Field, Error> {
        match self.forward_solve(guess, parameter)? {
            Outcome::Converged(state) => Ok(state),
            Outcome::Diverged { reason } => Err(Error::ForwardDiverged { reason }),
        }
    }

    /// Solves `(dF/du)ᵀ λ = −dE` and assembles `dJ = (dF/dp)ᵀ λ + dR`.
    ///
    /// Returns the adjoint state and the gradient.
    ///
    /// # Errors
    ///
    /// Returns an error if the Jacobians cannot be assembled or have the
    /// wrong shape, or if the adjoint solve fails.
    pub fn adjoint(&self, state: &Field, parameter: &Field) -> Result<(Field, Field), Error> {
        let (state_jacobian, parameter_jacobian) = self.jacobians(state, parameter)?;

        let rhs = -self.problem.objective().gradient(state);
        let adjoint = self.solve(&state_jacobian.transpose(), &rhs, true)?;

        let gradient = parameter_jacobian.tr_mul(&adjoint)
            + self.problem.regularization().gradient(parameter);
        if !gradient.iter().all(|v| v.is_finite()) {
            return Err(Error::NonFiniteGradient);
        }
        Ok((adjoint, gradient))
    }

    /// Assembles every derivative the Gauss-Newton operator needs.
    ///
    /// # Errors
    ///
    /// Returns an error if an operator cannot be assembled or has the wrong shape.
    pub fn linearize(&self, state: &Field, parameter: &Field) -> Result<Linearization, Error> {
        let (n, m) = (state.len(), parameter.len());
        let (state_jacobian, parameter_jacobian) = self.jacobians(state, parameter)?;

        let objective_hessian = self.problem.objective().hessian(state);
        check_shape("objective hessian", &objective_hessian, (n, n))?;

        let regularization_hessian = self.problem.regularization().hessian(parameter);
        check_shape("regularization hessian", &regularization_hessian, (m, m))?;

        let mass = self.mass(state, parameter)?;

        Ok(Linearization {
            state_jacobian,
            parameter_jacobian,
            objective_hessian,
            regularization_hessian,
            mass,
        })
    }

    /// Assembles the mass matrix of the parameter space.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be assembled or has the wrong shape.
    pub fn mass(&self, state: &Field, parameter: &Field) -> Result<Operator, Error> {
        let m = parameter.len();
        let args = self.arguments(state, parameter);
        let mass = self
            .problem
            .model()
            .parameter_mass(parameter, &args)
            .map_err(Error::model)?;
        check_shape("parameter mass", &mass, (m, m))?;
        Ok(mass)
    }

    /// Solves a linear system with the configured solver parameters.
    ///
    /// State-space systems pass `constrained = true` to impose the problem's
    /// homogeneous Dirichlet conditions.
    ///
    /// # Errors
    ///
    /// Propagates the linear solver's error.
    pub fn solve(&self, matrix: &Operator, rhs: &Field, constrained: bool) -> Result<Field, Error> {
        let bc = constrained.then(|| self.setup.dirichlet_bc());
        Ok(linear::solve(
            matrix,
            rhs,
            bc,
            self.setup.solver_parameters(),
        )?)
    }

    /// The objective `J = E(u) + R(p)`.
    #[must_use]
    pub fn merit(&self, state: &Field, parameter: &Field) -> f64 {
        self.problem.objective().value(state) + self.problem.regularization().value(parameter)
    }

    /// Evaluates `J` at `p + t q`, solving into a disposable state.
    pub(super) fn trial(
        &self,
        state: &Field,
        parameter: &Field,
        direction: &Field,
        t: f64,
    ) -> Result<Trial, Error> {
        let mut candidate = parameter.clone();
        candidate.axpy(t, direction, 1.0);

        match self.forward_solve(state, &candidate)? {
            Outcome::Converged(u) => Ok(Trial::Feasible(self.merit(&u, &candidate))),
            Outcome::Diverged { reason } => {
                warn!(step = t, %reason, "forward solve diverged, treating trial as infeasible");
                Ok(Trial::Infeasible)
            }
        }
    }

    fn jacobians(&self, state: &Field, parameter: &Field) -> Result<(Operator, Operator), Error> {
        let (n, m) = (state.len(), parameter.len());
        let args = self.arguments(state, parameter);
        let model = self.problem.model();

        let state_jacobian = model.state_jacobian(&args).map_err(Error::model)?;
        check_shape("state jacobian", &state_jacobian, (n, n))?;

        let parameter_jacobian = model.parameter_jacobian(&args).map_err(Error::model)?;
        check_shape("parameter jacobian", &parameter_jacobian, (n, m))?;

        Ok((state_jacobian, parameter_jacobian))
    }
}

fn check_shape(operator: &'static str, matrix: &Operator, expected: (usize, usize)) -> Result<(), Error> {
    let found = matrix.shape();
    if found == expected {
        Ok(())
    } else {
        Err(Error::Shape {
            operator,
            expected,
            found,
        })
    }
}
