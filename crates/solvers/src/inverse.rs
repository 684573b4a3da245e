//! Adjoint-based solvers for inverse problems.
//!
//! # Algorithm
//!
//! An [`InverseSolver`] minimizes `J(p) = E(u(p)) + R(p)` where the state
//! `u(p)` solves the forward model `F(u, p) = 0`. Each step:
//!
//! 1. runs a line search along the search direction `q` for a step length `t`,
//! 2. stages `p + t q` and solves the forward model for the new state,
//! 3. solves the adjoint equation `(dF/du)ᵀ λ = −dE` with homogeneous
//!    Dirichlet conditions and assembles `dJ = (dF/dp)ᵀ λ + dR`,
//! 4. asks the [`SearchDirection`] strategy for a new direction,
//! 5. commits the staged iterate and notifies the observer.
//!
//! A failure anywhere in steps 1 to 4 leaves the committed iterate untouched.
//!
//! Two strategies are provided: [`GradientDescent`] and [`GaussNewton`].
//!
//! # Observer Events
//!
//! The observer receives one [`Event`] after construction (iteration zero)
//! and one after every accepted step. Returning [`Action::StopEarly`] makes
//! [`InverseSolver::solve`] return [`Status::StoppedByObserver`].

mod action;
mod config;
mod context;
mod error;
mod event;
pub mod gauss_newton;
mod gradient_descent;
mod setup;
mod solution;
mod state;
mod strategy;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use context::{Context, Linearization};
pub use error::Error;
pub use event::Event;
pub use gauss_newton::{GaussNewton, GaussNewtonSolver};
pub use gradient_descent::{GradientDescent, GradientDescentSolver};
pub use setup::{Options, Setup};
pub use solution::{Solution, Status};
pub use state::SolverState;
pub use strategy::SearchDirection;

use invert_core::{Field, ForwardModel, Functional, InverseProblem, Observer};
use tracing::debug;

use crate::line_search;

/// Iteratively estimates the parameter of an [`InverseProblem`].
///
/// The solver borrows the problem and owns its own copy of the iterate, so
/// one problem can seed several solvers. The search direction strategy `S`
/// and the observer `Obs` are chosen at construction.
pub struct InverseSolver<'p, M: ForwardModel, E, R, S, Obs = ()> {
    problem: &'p InverseProblem<M, E, R>,
    setup: Setup,
    state: SolverState,
    strategy: S,
    observer: Obs,
    iterations: usize,
    stop_requested: bool,
}

impl<'p, M, E, R, S, Obs> InverseSolver<'p, M, E, R, S, Obs>
where
    M: ForwardModel,
    E: Functional,
    R: Functional,
    S: SearchDirection,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    /// Creates a solver with default options.
    ///
    /// Solves for the initial state, adjoint state, and search direction,
    /// then notifies the observer once.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the initial solves fail.
    pub fn new(problem: &'p InverseProblem<M, E, R>, strategy: S, observer: Obs) -> Result<Self, Error> {
        Self::with_options(problem, strategy, observer, Options::default())
    }

    /// Creates a solver with the given options.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or any of the initial
    /// solves fail.
    pub fn with_options(
        problem: &'p InverseProblem<M, E, R>,
        strategy: S,
        observer: Obs,
        options: Options,
    ) -> Result<Self, Error> {
        let line_search = options.line_search.or_else(|| strategy.line_search_config());
        let setup = Setup::new(problem, options.solver_parameters, line_search)?;
        debug!(
            quadrature_degree = setup.quadrature_degree(),
            dirichlet_dofs = setup.dirichlet_bc().dofs().len(),
            "inverse solver setup"
        );

        let mut solver = Self {
            problem,
            setup,
            state: SolverState::new(problem.parameter().clone(), problem.state().clone()),
            strategy,
            observer,
            iterations: 0,
            stop_requested: false,
        };

        solver.update_state()?;
        solver.update_adjoint_state()?;
        solver.update_search_direction()?;

        debug!(objective = solver.value(), "inverse solver initialized");
        if solver.notify(None).is_some() {
            solver.stop_requested = true;
        }
        Ok(solver)
    }

    /// Solves the forward model for the current parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails or the forward solve diverges.
    pub fn update_state(&mut self) -> Result<(), Error> {
        let ctx = Context::new(self.problem, &self.setup);
        self.state.state = ctx.solve_state(&self.state.state, &self.state.parameter)?;
        Ok(())
    }

    /// Solves for the adjoint state and updates the gradient.
    ///
    /// # Errors
    ///
    /// Returns an error if the Jacobians cannot be assembled or the adjoint
    /// solve fails.
    pub fn update_adjoint_state(&mut self) -> Result<(), Error> {
        let ctx = Context::new(self.problem, &self.setup);
        let (adjoint, gradient) = ctx.adjoint(&self.state.state, &self.state.parameter)?;
        self.state.adjoint = adjoint;
        self.state.gradient = gradient;
        Ok(())
    }

    /// Recomputes the search direction from the current gradient.
    ///
    /// # Errors
    ///
    /// Propagates the strategy's error.
    pub fn update_search_direction(&mut self) -> Result<(), Error> {
        let ctx = Context::new(self.problem, &self.setup);
        self.state.search_direction = self.strategy.search_direction(&ctx, &self.state)?;
        Ok(())
    }

    /// Finds a step length along the search direction that decreases `J`.
    ///
    /// Each trial solves the forward model into a disposable state. Trials
    /// where the forward solve diverges are treated as infeasible.
    ///
    /// # Errors
    ///
    /// Returns an error if no decrease can be found, the minimizer does not
    /// converge, or a model evaluation fails.
    pub fn line_search(&self) -> Result<f64, Error> {
        let config = self.setup.line_search().copied().unwrap_or_default();
        let ctx = self.context();
        let SolverState {
            parameter,
            state,
            search_direction,
            ..
        } = &self.state;

        let mut f = |t: f64| ctx.trial(state, parameter, search_direction, t);

        let descent = line_search::feasible_step(&mut f, &config)?;
        let triple = line_search::bracket(&mut f, descent.start(), descent.point(), &config)?;
        let solution = line_search::minimize(&mut f, &triple, &config)?;

        match solution.status {
            line_search::Status::Converged => Ok(solution.x),
            line_search::Status::MaxIters => Err(Error::LineSearch {
                message: format!(
                    "golden section search did not converge in {} iterations",
                    solution.iters
                ),
            }),
        }
    }

    /// Takes one step and returns the observer's action, if any.
    ///
    /// The new parameter, state, adjoint state, gradient, and search
    /// direction are computed on a staged copy of the iterate, which replaces
    /// the committed iterate only once every computation has succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the line search or any of the solves fail. The
    /// iterate is then left unchanged.
    pub fn step(&mut self) -> Result<Option<Action>, Error> {
        let t = self.line_search()?;

        let ctx = Context::new(self.problem, &self.setup);
        let mut staged = self.state.clone();
        staged
            .parameter
            .axpy(t, &self.state.search_direction, 1.0);
        staged.state = ctx.solve_state(&staged.state, &staged.parameter)?;
        (staged.adjoint, staged.gradient) = ctx.adjoint(&staged.state, &staged.parameter)?;
        staged.search_direction = self.strategy.search_direction(&ctx, &staged)?;

        self.state = staged;
        self.iterations += 1;
        debug!(
            iteration = self.iterations,
            step_length = t,
            objective = self.value(),
            "inverse solver step"
        );

        Ok(self.notify(Some(t)))
    }

    /// Steps until the objective falls below a threshold or stops improving.
    ///
    /// Before each step, the solver evaluates `J`. It returns
    /// [`Status::BelowThreshold`] if `J ≤ atol`, or [`Status::Stalled`] if
    /// `J` improved on the previous evaluation by less than `rtol` times the
    /// previous value. The first evaluation is compared against `+∞`, so at
    /// least one step is taken unless `J ≤ atol` already holds.
    ///
    /// The iteration has also stalled once the search direction no longer
    /// descends measurably (`dJ · q ≥ −ε |J|`), or once the line search finds
    /// no step length that decreases `J`. Both happen when a step lands on
    /// the minimizer and the next direction is rounding noise.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or a step fails.
    pub fn solve(&mut self, config: &Config) -> Result<Solution, Error> {
        config.validate()?;

        let finish = |solver: &Self, status, iterations| {
            let solution = Solution {
                status,
                iterations,
                objective: solver.value(),
            };
            debug!(
                status = ?solution.status,
                iterations,
                objective = solution.objective,
                "inverse solve finished"
            );
            solution
        };

        if self.stop_requested {
            return Ok(finish(self, Status::StoppedByObserver, 0));
        }

        let mut previous = f64::INFINITY;
        let mut iteration = 0;
        loop {
            if config.max_iterations.is_some_and(|max| iteration >= max) {
                return Ok(finish(self, Status::MaxIterations, iteration));
            }

            let value = self.value();
            if value <= config.atol {
                return Ok(finish(self, Status::BelowThreshold, iteration));
            }
            if previous - value < config.rtol * previous || self.is_stationary(value) {
                return Ok(finish(self, Status::Stalled, iteration));
            }
            previous = value;

            let action = match self.step() {
                Ok(action) => action,
                Err(Error::Bracket(line_search::Error::NoDescent { halvings })) => {
                    debug!(halvings, "no step length decreases the objective");
                    return Ok(finish(self, Status::Stalled, iteration));
                }
                Err(err) => return Err(err),
            };
            iteration += 1;
            if let Some(Action::StopEarly) = action {
                return Ok(finish(self, Status::StoppedByObserver, iteration));
            }
        }
    }

    fn is_stationary(&self, value: f64) -> bool {
        let slope = self.state.gradient.dot(&self.state.search_direction);
        slope >= -f64::EPSILON * value.abs()
    }

    fn notify(&mut self, step_length: Option<f64>) -> Option<Action> {
        let objective = self.problem.objective().value(&self.state.state);
        let regularization = self.problem.regularization().value(&self.state.parameter);
        let event = Event {
            iteration: self.iterations,
            step_length,
            objective,
            regularization,
            state: &self.state,
        };
        self.observer.observe(&event)
    }
}

impl<'p, M, E, R, S, Obs> InverseSolver<'p, M, E, R, S, Obs>
where
    M: ForwardModel,
    E: Functional,
    R: Functional,
{
    /// The problem being solved.
    #[must_use]
    pub fn problem(&self) -> &'p InverseProblem<M, E, R> {
        self.problem
    }

    /// The data derived from the problem at construction.
    #[must_use]
    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// The current iterate.
    #[must_use]
    pub fn solver_state(&self) -> &SolverState {
        &self.state
    }

    /// The current parameter `p`.
    #[must_use]
    pub fn parameter(&self) -> &Field {
        self.state.parameter()
    }

    /// The state `u` solved from the current parameter.
    #[must_use]
    pub fn state(&self) -> &Field {
        self.state.state()
    }

    /// The adjoint state `λ`.
    #[must_use]
    pub fn adjoint_state(&self) -> &Field {
        self.state.adjoint()
    }

    /// The current search direction `q`.
    #[must_use]
    pub fn search_direction(&self) -> &Field {
        self.state.search_direction()
    }

    /// The gradient `dJ` at the current iterate.
    #[must_use]
    pub fn gradient(&self) -> &Field {
        self.state.gradient()
    }

    /// The misfit `E(u)` at the current state.
    #[must_use]
    pub fn objective_value(&self) -> f64 {
        self.problem.objective().value(&self.state.state)
    }

    /// The regularization `R(p)` at the current parameter.
    #[must_use]
    pub fn regularization_value(&self) -> f64 {
        self.problem.regularization().value(&self.state.parameter)
    }

    /// The objective `J = E(u) + R(p)`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.objective_value() + self.regularization_value()
    }

    /// Quadrature degree chosen by the model at setup.
    #[must_use]
    pub fn quadrature_degree(&self) -> usize {
        self.setup.quadrature_degree()
    }

    /// Number of steps taken since construction.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The search direction strategy.
    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The observer.
    #[must_use]
    pub fn observer(&self) -> &Obs {
        &self.observer
    }

    /// Consumes the solver, returning the final iterate and the observer.
    #[must_use]
    pub fn into_parts(self) -> (SolverState, Obs) {
        (self.state, self.observer)
    }

    fn context(&self) -> Context<'_, M, E, R> {
        Context::new(self.problem, &self.setup)
    }
}
