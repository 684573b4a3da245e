use std::convert::Infallible;

use approx::assert_relative_eq;
use thiserror::Error;

use super::{Config, Error, Point, Status, Trial, bracket, feasible_step, minimize};

fn feasible(f: impl Fn(f64) -> f64) -> impl FnMut(f64) -> Result<Trial, Infallible> {
    move |t| Ok(Trial::Feasible(f(t)))
}

#[test]
fn feasible_step_halves_until_descent() {
    // f(1) = 0.49 > f(0) = 0.09, f(0.5) = 0.04 < f(0).
    let f = feasible(|t| (t - 0.3).powi(2));

    let descent = feasible_step(f, &Config::default()).unwrap();

    assert_relative_eq!(descent.step, 0.5);
    assert_relative_eq!(descent.initial, 0.09);
    assert!(descent.value < descent.initial);
    assert!(0.0 < descent.step && descent.step < 1.0);
}

#[test]
fn feasible_step_accepts_unit_step() {
    let f = feasible(|t| (t - 2.0).powi(2));

    let descent = feasible_step(f, &Config::default()).unwrap();

    assert_relative_eq!(descent.step, 1.0);
}

#[test]
fn feasible_step_gives_up_when_zero_is_optimal() {
    // f(t) = t² has no t > 0 with f(t) < f(0).
    let f = feasible(|t| t * t);
    let config = Config {
        max_halvings: 20,
        ..Config::default()
    };

    let error = feasible_step(f, &config).unwrap_err();

    assert!(matches!(error, Error::NoDescent { halvings: 20 }));
}

#[test]
fn feasible_step_skips_infeasible_trials() {
    // Steps above 0.2 make the forward solve diverge.
    let mut trials = Vec::new();
    let f = |t: f64| -> Result<Trial, Infallible> {
        trials.push(t);
        if t > 0.2 {
            Ok(Trial::Infeasible)
        } else {
            Ok(Trial::Feasible((t - 1.0).powi(2)))
        }
    };

    let descent = feasible_step(f, &Config::default()).unwrap();

    assert_relative_eq!(descent.step, 0.125);
    assert_eq!(trials, [0.0, 1.0, 0.5, 0.25, 0.125]);
}

#[test]
fn feasible_step_rejects_infeasible_start() {
    let f = |_t: f64| -> Result<Trial, Infallible> { Ok(Trial::Infeasible) };

    let error = feasible_step(f, &Config::default()).unwrap_err();

    assert!(matches!(error, Error::NonFiniteStart));
}

#[derive(Debug, Error)]
#[error("solver exploded")]
struct Exploded;

#[test]
fn evaluation_errors_propagate() {
    let f = |t: f64| if t > 0.0 { Err(Exploded) } else { Ok(Trial::Feasible(1.0)) };

    let error = feasible_step(f, &Config::default()).unwrap_err();

    assert!(matches!(error, Error::Evaluation(_)));
    assert_eq!(error.to_string(), "evaluation failed: solver exploded");
}

#[test]
fn bracket_expands_downhill() {
    let mut f = feasible(|t| (t - 5.0).powi(2));
    let start = Point::new(0.0, 25.0);
    let first = Point::new(1.0, 16.0);

    let triple = bracket(&mut f, start, first, &Config::default()).unwrap();

    assert!(triple.a.x < triple.b.x && triple.b.x < triple.c.x);
    assert!(triple.b.value <= triple.a.value);
    assert!(triple.b.value <= triple.c.value);
    assert!(triple.a.x < 5.0 && 5.0 < triple.c.x);
}

#[test]
fn bracket_treats_infeasible_points_as_uphill() {
    let f = |t: f64| -> Result<Trial, Infallible> {
        if t > 1.5 {
            Ok(Trial::Infeasible)
        } else {
            Ok(Trial::Feasible(-t))
        }
    };

    let triple = bracket(f, Point::new(0.0, 0.0), Point::new(1.0, -1.0), &Config::default())
        .unwrap();

    assert_relative_eq!(triple.b.x, 1.0);
    assert_eq!(triple.c.value, f64::INFINITY);
}

#[test]
fn bracket_fails_on_unbounded_descent() {
    let f = feasible(|t| -t);
    let config = Config {
        max_expansions: 5,
        ..Config::default()
    };

    let error = bracket(f, Point::new(0.0, 0.0), Point::new(1.0, -1.0), &config).unwrap_err();

    assert!(matches!(error, Error::BracketNotFound { expansions: 5 }));
}

#[test]
fn full_search_finds_quadratic_minimum() {
    let mut f = feasible(|t| (t - 0.3).powi(2) + 1.0);
    let config = Config::default();

    let descent = feasible_step(&mut f, &config).unwrap();
    let triple = bracket(&mut f, descent.start(), descent.point(), &config).unwrap();
    let solution = minimize(&mut f, &triple, &config).unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x, 0.3, epsilon = 1e-6);
    assert_relative_eq!(solution.objective, 1.0, epsilon = 1e-10);
    assert!(solution.objective <= descent.value);
}

#[test]
fn minimize_reports_iteration_limit() {
    let mut f = feasible(|t| (t - 0.3).powi(2));
    let config = Config {
        max_iters: 3,
        ..Config::default()
    };
    let triple = bracket(
        &mut f,
        Point::new(0.0, 0.09),
        Point::new(0.5, 0.04),
        &config,
    )
    .unwrap();

    let solution = minimize(&mut f, &triple, &config).unwrap();

    assert_eq!(solution.status, Status::MaxIters);
    assert_eq!(solution.iters, 3);
    assert!(solution.objective <= 0.04);
}

#[test]
fn invalid_config_is_rejected() {
    let config = Config {
        x_rel_tol: -1.0,
        ..Config::default()
    };

    let error = feasible_step(feasible(|t| t), &config).unwrap_err();

    assert!(matches!(error, Error::Config(_)));
}
