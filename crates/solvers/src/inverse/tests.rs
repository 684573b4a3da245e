use approx::assert_relative_eq;
use proptest::prelude::*;
use thiserror::Error;

use invert_core::{
    Arguments, Field, ForwardModel, Functional, InverseProblem, Misfit, Operator, Outcome,
    Tikhonov, Zero,
};

use crate::{
    line_search,
    linear::{self, DirichletBc, SolverParameters},
};

use super::{
    Action, Config, ConfigError, Context, Error, Event, GaussNewton, GaussNewtonSolver,
    GradientDescent, GradientDescentSolver, InverseSolver, Options, SearchDirection, SolverState,
    Status,
    gauss_newton::{self, PcgStatus},
};

#[derive(Debug, Error)]
enum ModelError {
    #[error(transparent)]
    Linear(#[from] linear::Error),

    #[error("jacobian unavailable at p = {0}")]
    Jacobian(f64),
}

/// `F(u, p) = A u − B p` with homogeneous Dirichlet conditions on the boundary ids.
#[derive(Debug, Clone)]
struct Linear {
    a: Operator,
    b: Operator,
    diverge_above: f64,
    jacobian_fails_above: f64,
}

impl Linear {
    fn new(a: Operator, b: Operator) -> Self {
        Self {
            a,
            b,
            diverge_above: f64::INFINITY,
            jacobian_fails_above: f64::INFINITY,
        }
    }

    fn largest(args: &Arguments) -> f64 {
        args.field("p").expect("parameter bound").max()
    }
}

impl ForwardModel for Linear {
    type Error = ModelError;

    fn solve(&self, args: &Arguments) -> Result<Outcome<Field>, Self::Error> {
        let p = args.field("p").expect("parameter bound");
        if Self::largest(args) > self.diverge_above {
            return Ok(Outcome::Diverged {
                reason: "parameter out of range".into(),
            });
        }
        let bc = DirichletBc::new(self.dirichlet_dofs(args));
        let u = linear::solve(&self.a, &(&self.b * p), Some(&bc), &SolverParameters::default())?;
        Ok(Outcome::Converged(u))
    }

    fn state_jacobian(&self, args: &Arguments) -> Result<Operator, Self::Error> {
        let largest = Self::largest(args);
        if largest > self.jacobian_fails_above {
            return Err(ModelError::Jacobian(largest));
        }
        Ok(self.a.clone())
    }

    fn parameter_jacobian(&self, _args: &Arguments) -> Result<Operator, Self::Error> {
        Ok(-&self.b)
    }
}

fn field(values: &[f64]) -> Field {
    Field::from_column_slice(values)
}

/// `u = p` with `E(u) = (u − 1)²` and no regularization.
fn identity_problem<M: ForwardModel>(model: M) -> InverseProblem<M, Misfit, Zero> {
    InverseProblem::new(
        model,
        Misfit::new(field(&[1.0]))
            .with_weight(Operator::identity(1, 1) * 2.0)
            .expect("square weight"),
        Zero,
        ("u", Field::zeros(1)),
        ("p", Field::zeros(1)),
    )
    .expect("valid problem")
}

/// `R(p) = ½ α |p|²` on a 2-parameter space.
fn ridge(strength: f64) -> Tikhonov {
    Tikhonov::new(strength, Field::zeros(2), Operator::identity(2, 2)).expect("valid regularization")
}

fn identity() -> Linear {
    Linear::new(Operator::identity(1, 1), Operator::identity(1, 1))
}

/// `u = diag(1, 10) p`, a quadratic objective with condition number 100.
fn ill_scaled_problem<R: Functional>(regularization: R) -> InverseProblem<Linear, Misfit, R> {
    let model = Linear::new(
        Operator::identity(2, 2),
        Operator::from_diagonal(&field(&[1.0, 10.0])),
    );
    InverseProblem::new(
        model,
        Misfit::new(field(&[1.0, 2.0])),
        regularization,
        ("u", Field::zeros(2)),
        ("p", Field::zeros(2)),
    )
    .expect("valid problem")
}

/// A non-symmetric 3-state, 2-parameter model with a Dirichlet node.
fn coupled_problem() -> InverseProblem<Linear, Misfit, Tikhonov> {
    let model = Linear::new(
        Operator::from_row_slice(3, 3, &[3.0, 1.0, 0.0, -1.0, 4.0, 1.0, 0.0, -1.0, 3.0]),
        Operator::from_row_slice(3, 2, &[1.0, 0.0, 0.5, 1.0, 0.0, 2.0]),
    );
    InverseProblem::new(
        model,
        Misfit::new(field(&[0.0, 1.0, -1.0]))
            .with_weight(Operator::from_diagonal(&field(&[1.0, 2.0, 3.0])))
            .expect("square weight"),
        ridge(0.1),
        ("u", Field::zeros(3)),
        ("p", field(&[0.3, -0.2])),
    )
    .expect("valid problem")
    .with_dirichlet_ids([0])
}

fn forward(problem: &InverseProblem<Linear, Misfit, Tikhonov>, p: &Field) -> Field {
    let args = problem.bind(problem.state(), p);
    problem
        .model()
        .solve(&args)
        .expect("solvable")
        .converged()
        .expect("converged")
}

#[test]
fn identity_gradient_descent_steps_to_optimum() {
    let problem = identity_problem(identity());
    let mut solver = GradientDescentSolver::gradient_descent(&problem).unwrap();

    assert_relative_eq!(solver.adjoint_state()[0], 2.0);
    assert_relative_eq!(solver.gradient()[0], -2.0);
    assert_relative_eq!(solver.search_direction()[0], 2.0);
    assert_relative_eq!(solver.line_search().unwrap(), 0.5);

    solver.step().unwrap();

    assert_relative_eq!(solver.parameter()[0], 1.0);
    assert_relative_eq!(solver.state()[0], 1.0);
    assert_relative_eq!(solver.value(), 0.0);
    assert_eq!(solver.iterations(), 1);
}

#[test]
fn identity_gauss_newton_needs_one_inner_iteration() {
    let problem = identity_problem(identity());
    let mut solver = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default())
        .unwrap();

    let report = solver.pcg_report().copied().unwrap();
    assert_eq!(report.iterations, 1);
    assert_eq!(report.status, PcgStatus::Converged);
    assert_relative_eq!(solver.search_direction()[0], 1.0);
    assert_relative_eq!(solver.line_search().unwrap(), 1.0);

    let solution = solver
        .solve(&Config {
            atol: 1e-12,
            ..Config::default()
        })
        .unwrap();

    assert_eq!(solution.status, Status::BelowThreshold);
    assert_eq!(solution.iterations, 1);
    assert_relative_eq!(solver.parameter()[0], 1.0);
}

#[test]
fn identity_gauss_newton_operator() {
    let problem = identity_problem(identity());
    let solver = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default())
        .unwrap();
    let q = field(&[1.0]);

    assert_relative_eq!(solver.gauss_newton_mult(&q).unwrap()[0], 2.0);
    assert_relative_eq!(solver.gauss_newton_energy_norm(&q).unwrap(), 2.0);
}

#[test]
fn gauss_newton_outperforms_gradient_descent_when_ill_scaled() {
    let problem = ill_scaled_problem(Zero);
    let config = Config {
        atol: 1e-20,
        rtol: 0.0,
        max_iterations: Some(5),
    };

    let mut gd = GradientDescentSolver::gradient_descent(&problem).unwrap();
    let gd_solution = gd.solve(&config).unwrap();

    let mut gn = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default())
        .unwrap();
    let inner = gn.pcg_report().copied().unwrap();
    let gn_solution = gn.solve(&config).unwrap();

    assert!(inner.iterations <= problem.parameter().len());
    assert_eq!(gd_solution.status, Status::MaxIterations);
    assert_eq!(gn_solution.status, Status::BelowThreshold);
    assert_eq!(gn_solution.iterations, 1);
    assert!(gd.value() > 1e-4);
    assert_relative_eq!(gn.parameter(), &field(&[1.0, 0.2]), epsilon = 1e-10);
}

#[test]
fn solve_takes_exactly_max_iterations() {
    let problem = ill_scaled_problem(ridge(1e-3));
    let mut solver = GradientDescentSolver::gradient_descent(&problem).unwrap();

    let solution = solver
        .solve(&Config {
            atol: 0.0,
            rtol: 0.0,
            max_iterations: Some(3),
        })
        .unwrap();

    assert_eq!(solution.status, Status::MaxIterations);
    assert_eq!(solution.iterations, 3);
    assert_eq!(solver.iterations(), 3);
    assert_relative_eq!(solution.objective, solver.value());
}

#[test]
fn objective_never_increases() {
    let problem = ill_scaled_problem(ridge(1e-2));
    let mut values = Vec::new();
    let observer = |event: &Event<'_>| -> Option<Action> {
        values.push(event.value());
        None
    };

    let mut solver = InverseSolver::new(&problem, GradientDescent, observer).unwrap();
    solver.solve(&Config::with_max_iterations(6)).unwrap();
    drop(solver);

    assert!(values.len() >= 2);
    assert!(values.windows(2).all(|pair| pair[1] <= pair[0]));
}

#[test]
fn observer_sees_construction_and_can_stop() {
    let problem = ill_scaled_problem(Zero);
    let mut events = Vec::new();
    let observer = |event: &Event<'_>| -> Option<Action> {
        events.push((event.iteration, event.step_length));
        (event.iteration == 2).then_some(Action::StopEarly)
    };

    let mut solver = InverseSolver::new(&problem, GradientDescent, observer).unwrap();
    let solution = solver.solve(&Config::default()).unwrap();
    drop(solver);

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.iterations, 2);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], (0, None));
    assert!(events[1].1.is_some_and(|t| t > 0.0));
}

#[test]
fn stop_at_construction_skips_solve() {
    let problem = ill_scaled_problem(Zero);
    let observer = |_event: &Event<'_>| Some(Action::StopEarly);

    let mut solver = InverseSolver::new(&problem, GradientDescent, observer).unwrap();
    let solution = solver.solve(&Config::default()).unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.iterations, 0);
    assert_eq!(solver.iterations(), 0);
}

#[test]
fn failed_step_leaves_iterate_unchanged() {
    // The line search lands on p = 1, where the Jacobian cannot be assembled.
    let model = Linear {
        jacobian_fails_above: 0.5,
        ..identity()
    };
    let problem = identity_problem(model);
    let mut solver = GradientDescentSolver::gradient_descent(&problem).unwrap();
    let before = solver.solver_state().clone();

    let error = solver.step().unwrap_err();

    assert!(matches!(error, Error::Model(_)));
    assert_eq!(solver.solver_state(), &before);
    assert_eq!(solver.iterations(), 0);
}

#[test]
fn line_search_skips_diverged_trials() {
    // Trials with p > 0.6 diverge; the unconstrained optimum is p = 1.
    let model = Linear {
        diverge_above: 0.6,
        ..identity()
    };
    let problem = identity_problem(model);
    let mut solver = GradientDescentSolver::gradient_descent(&problem).unwrap();
    let initial = solver.value();

    solver.step().unwrap();

    let p = solver.parameter()[0];
    assert!(p > 0.5 && p <= 0.6, "p = {p}");
    assert!(solver.value() < initial);
    assert_relative_eq!(solver.state()[0], p);
}

#[test]
fn construction_fails_when_initial_solve_diverges() {
    let model = Linear {
        diverge_above: -1.0,
        ..identity()
    };
    let problem = identity_problem(model);

    let result = GradientDescentSolver::gradient_descent(&problem);

    assert!(matches!(result, Err(Error::ForwardDiverged { .. })));
}

#[test]
fn construction_is_consistent_with_forward_solve() {
    let problem = coupled_problem();
    let expected = forward(&problem, problem.parameter());

    let gd = GradientDescentSolver::gradient_descent(&problem).unwrap();
    let gn = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default()).unwrap();

    for (parameter, state) in [(gd.parameter(), gd.state()), (gn.parameter(), gn.state())] {
        assert_eq!(parameter, problem.parameter());
        assert_relative_eq!(state, &expected, epsilon = 1e-12);
        assert_relative_eq!(state[0], 0.0);
    }
    assert_eq!(gd.quadrature_degree(), 2);
    assert_relative_eq!(gd.adjoint_state()[0], 0.0);
}

#[test]
fn adjoint_gradient_matches_finite_differences() {
    let problem = coupled_problem();
    let solver = GradientDescentSolver::gradient_descent(&problem).unwrap();
    let merit = |p: &Field| {
        problem.objective().value(&forward(&problem, p)) + problem.regularization().value(p)
    };
    let h = 1e-6;

    for i in 0..2 {
        let mut plus = problem.parameter().clone();
        let mut minus = problem.parameter().clone();
        plus[i] += h;
        minus[i] -= h;
        let fd = (merit(&plus) - merit(&minus)) / (2.0 * h);
        assert_relative_eq!(solver.gradient()[i], fd, epsilon = 1e-7);
    }
}

#[test]
fn gauss_newton_direction_solves_normal_equations() {
    let problem = coupled_problem();
    let solver = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default())
        .unwrap();

    let hq = solver.gauss_newton_mult(solver.search_direction()).unwrap();

    assert_relative_eq!(hq, -solver.gradient(), epsilon = 1e-10);
}

#[test]
fn rejects_invalid_configuration() {
    let problem = identity_problem(identity());

    let gn = GaussNewtonSolver::gauss_newton(
        &problem,
        gauss_newton::Config::with_search_tolerance(0.0),
    );
    assert!(matches!(
        gn,
        Err(Error::Config(ConfigError::SearchTolerance))
    ));

    let mut gd = GradientDescentSolver::gradient_descent(&problem).unwrap();
    let result = gd.solve(&Config {
        rtol: -1.0,
        ..Config::default()
    });
    assert!(matches!(result, Err(Error::Config(ConfigError::Rtol))));
}

/// Claims a two-dimensional state for a one-dimensional problem.
struct Misshapen;

impl ForwardModel for Misshapen {
    type Error = ModelError;

    fn solve(&self, args: &Arguments) -> Result<Outcome<Field>, Self::Error> {
        Ok(Outcome::Converged(args.field("p").expect("parameter bound").clone()))
    }

    fn state_jacobian(&self, _args: &Arguments) -> Result<Operator, Self::Error> {
        Ok(Operator::identity(2, 2))
    }

    fn parameter_jacobian(&self, _args: &Arguments) -> Result<Operator, Self::Error> {
        Ok(-Operator::identity(1, 1))
    }
}

#[test]
fn reports_misshapen_jacobians() {
    let problem = identity_problem(Misshapen);

    let result = GradientDescentSolver::gradient_descent(&problem);

    assert!(matches!(
        result,
        Err(Error::Shape {
            operator: "state jacobian",
            expected: (1, 1),
            found: (2, 2),
        })
    ));
}

struct Poisoned;

impl ForwardModel for Poisoned {
    type Error = ModelError;

    fn solve(&self, args: &Arguments) -> Result<Outcome<Field>, Self::Error> {
        Ok(Outcome::Converged(args.field("p").expect("parameter bound").clone()))
    }

    fn state_jacobian(&self, _args: &Arguments) -> Result<Operator, Self::Error> {
        Ok(Operator::identity(1, 1))
    }

    fn parameter_jacobian(&self, _args: &Arguments) -> Result<Operator, Self::Error> {
        Ok(Operator::from_element(1, 1, f64::NAN))
    }
}

#[test]
fn rejects_non_finite_gradient() {
    let problem = identity_problem(Poisoned);

    let result = GradientDescentSolver::gradient_descent(&problem);

    assert!(matches!(result, Err(Error::NonFiniteGradient)));
}

#[test]
fn strategy_supplies_line_search_tolerance() {
    let problem = identity_problem(identity());

    let gn = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default()).unwrap();
    let gd = GradientDescentSolver::gradient_descent(&problem).unwrap();

    let expected = gauss_newton::Config::default().search_tolerance / 2.0;
    assert_relative_eq!(gn.setup().line_search().unwrap().x_rel_tol, expected);
    assert!(gd.setup().line_search().is_none());
}

#[test]
fn options_select_linear_solver_and_line_search() {
    let problem = ill_scaled_problem(ridge(1e-2));
    let options = Options {
        solver_parameters: SolverParameters::cg(linear::Pc::Jacobi),
        line_search: Some(line_search::Config::with_x_rel_tol(1e-4)),
    };

    let cg = InverseSolver::with_options(&problem, GaussNewton::default(), (), options).unwrap();
    let direct = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default())
        .unwrap();

    assert_relative_eq!(cg.setup().line_search().unwrap().x_rel_tol, 1e-4);
    assert_relative_eq!(cg.search_direction(), direct.search_direction(), epsilon = 1e-6);
}

#[test]
fn gauss_newton_stalls_at_the_minimizer() {
    for problem in [coupled_problem(), ill_scaled_problem(ridge(1e-3))] {
        let mut solver =
            GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default()).unwrap();

        let solution = solver.solve(&Config::default()).unwrap();

        assert!(
            matches!(solution.status, Status::Stalled | Status::BelowThreshold),
            "{solution:?}"
        );
        assert!(solution.iterations >= 1);

        // Solving again from the minimizer takes no further steps.
        let again = solver.solve(&Config::default()).unwrap();
        assert_eq!(again.status, Status::Stalled);
        assert_eq!(again.iterations, 0);
        assert_relative_eq!(again.objective, solution.objective);
    }
}

/// Searches along a direction so long that every halved step overshoots.
struct Overshoot;

impl SearchDirection for Overshoot {
    fn search_direction<M, E, R>(
        &mut self,
        _ctx: &Context<'_, M, E, R>,
        state: &SolverState,
    ) -> Result<Field, Error>
    where
        M: ForwardModel,
        E: Functional,
        R: Functional,
    {
        Ok(state.gradient() * -1e40)
    }
}

#[test]
fn missing_descent_ends_the_solve_as_stalled() {
    let problem = ill_scaled_problem(Zero);
    let mut solver = InverseSolver::new(&problem, Overshoot, ()).unwrap();
    let before = solver.solver_state().clone();

    assert!(matches!(
        solver.step(),
        Err(Error::Bracket(line_search::Error::NoDescent { .. }))
    ));

    let solution = solver.solve(&Config::default()).unwrap();

    assert_eq!(solution.status, Status::Stalled);
    assert_eq!(solution.iterations, 0);
    assert_eq!(solver.solver_state(), &before);
}

#[test]
fn inner_solve_stops_at_its_iteration_cap() {
    let problem = coupled_problem();
    let config = gauss_newton::Config {
        max_iterations: 1,
        ..gauss_newton::Config::default()
    };

    let solver = GaussNewtonSolver::gauss_newton(&problem, config).unwrap();

    let report = solver.pcg_report().copied().unwrap();
    assert_eq!(report.status, PcgStatus::MaxIterations);
    assert_eq!(report.iterations, 1);
    assert!(report.cost < 0.0);
    assert!(solver.gradient().dot(solver.search_direction()) < 0.0);
}

#[test]
fn inner_solve_breaks_down_on_indefinite_misfit() {
    // E(u) = −½ (u − 1)², so the Gauss-Newton operator is −1.
    let problem = InverseProblem::new(
        identity(),
        Misfit::new(field(&[1.0]))
            .with_weight(-Operator::identity(1, 1))
            .expect("square weight"),
        Zero,
        ("u", Field::zeros(1)),
        ("p", Field::zeros(1)),
    )
    .expect("valid problem");

    let solver = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default()).unwrap();

    let report = solver.pcg_report().copied().unwrap();
    assert_eq!(report.status, PcgStatus::Breakdown);
    assert_eq!(report.iterations, 1);
    // The first preconditioned direction is kept: q = −dJ = −1.
    assert_relative_eq!(solver.search_direction()[0], -1.0);
    assert_relative_eq!(report.cost, -1.5);
}

proptest! {
    #[test]
    fn energy_norm_is_consistent_with_mult(
        q0 in -10.0f64..10.0,
        q1 in -10.0f64..10.0,
    ) {
        let problem = coupled_problem();
        let solver = GaussNewtonSolver::gauss_newton(&problem, gauss_newton::Config::default())
            .unwrap();
        let q = field(&[q0, q1]);

        let energy = solver.gauss_newton_energy_norm(&q).unwrap();
        let inner = q.dot(&solver.gauss_newton_mult(&q).unwrap());

        prop_assert!(energy >= 0.0);
        prop_assert!((energy - inner).abs() <= 1e-10 * (1.0 + energy.abs()));
    }
}
