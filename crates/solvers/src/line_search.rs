//! Scalar line search for merit functions of a step length.
//!
//! # Algorithm
//!
//! A line search minimizes `f(t)` for `t ≥ 0`, where `f(0)` is the merit at
//! the current iterate. It runs in three phases:
//!
//! 1. [`feasible_step`] starts at `t = 1` and halves until `f(t) < f(0)`.
//! 2. [`bracket`] expands downhill from `(0, t)` by the golden ratio until
//!    the middle point of a triple `(a, b, c)` is no worse than its ends.
//! 3. [`minimize`] shrinks the triple by golden section search.
//!
//! Each trial returns a [`Trial`]. A trial may be [`Trial::Infeasible`], for
//! example when the forward solve diverges at that step length. Halving skips
//! infeasible trials, and bracketing and minimization treat them as `+∞`.
//!
//! The best point returned by [`minimize`] is never worse than the middle of
//! the bracket, so the accepted step always satisfies `f(t) < f(0)`.

mod config;
mod descent;
mod error;
mod golden;
mod point;
mod solution;
mod trial;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError};
pub use descent::{Descent, Triple};
pub use error::Error;
pub use point::Point;
pub use solution::{Solution, Status};
pub use trial::Trial;

use tracing::trace;

/// The golden ratio: φ = (1 + √5) / 2
const PHI: f64 = 1.618_033_988_749_895;

/// Finds a step length that strictly decreases `f` below `f(0)`.
///
/// # Errors
///
/// Returns [`Error::NonFiniteStart`] if `f(0)` is infeasible or not finite,
/// [`Error::NoDescent`] if no descent is found within the halving limit, and
/// [`Error::Evaluation`] if a trial fails.
pub fn feasible_step<F, E>(mut f: F, config: &Config) -> Result<Descent, Error>
where
    F: FnMut(f64) -> Result<Trial, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    config.validate()?;

    let initial = match f(0.0).map_err(Error::evaluation)? {
        Trial::Feasible(value) if value.is_finite() => value,
        _ => return Err(Error::NonFiniteStart),
    };

    let mut t = 1.0;
    for halving in 0..=config.max_halvings {
        match f(t).map_err(Error::evaluation)? {
            Trial::Feasible(value) if value < initial => {
                trace!(step = t, value, halving, "found descent");
                return Ok(Descent {
                    step: t,
                    value,
                    initial,
                });
            }
            trial => trace!(step = t, ?trial, halving, "no descent"),
        }
        t /= 2.0;
    }

    Err(Error::NoDescent {
        halvings: config.max_halvings,
    })
}

/// Expands downhill from `first` through `second` until a bracketing triple is found.
///
/// Requires `f(second) < f(first)`.
/// Points further along the same direction are tried at golden-ratio growth.
///
/// # Errors
///
/// Returns [`Error::BracketNotFound`] if `f` keeps decreasing past the
/// expansion limit, and [`Error::Evaluation`] if a trial fails.
pub fn bracket<F, E>(mut f: F, first: Point, second: Point, config: &Config) -> Result<Triple, Error>
where
    F: FnMut(f64) -> Result<Trial, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    config.validate()?;

    let (mut a, mut b) = (first, second);
    for expansion in 0..config.max_expansions {
        let x = b.x + PHI * (b.x - a.x);
        let c = Point::new(x, f(x).map_err(Error::evaluation)?.score());
        trace!(a = a.x, b = b.x, c = c.x, expansion, "bracket");

        if c.value >= b.value {
            return Ok(Triple { a, b, c });
        }
        a = b;
        b = c;
    }

    Err(Error::BracketNotFound {
        expansions: config.max_expansions,
    })
}

/// Minimizes `f` within a bracketing triple by golden section search.
///
/// # Errors
///
/// Returns [`Error::Evaluation`] if a trial fails.
pub fn minimize<F, E>(mut f: F, triple: &Triple, config: &Config) -> Result<Solution, Error>
where
    F: FnMut(f64) -> Result<Trial, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    config.validate()?;

    let mut eval = |x: f64| -> Result<Point, Error> {
        let value = f(x).map_err(Error::evaluation)?.score();
        trace!(x, value, "golden section trial");
        Ok(Point::new(x, value))
    };

    let mut search = golden::Search::new(triple, &mut eval)?;

    for iter in 0..config.max_iters {
        if search.is_converged(config) {
            return Ok(search.into_solution(Status::Converged, iter));
        }
        search.shrink(&mut eval)?;
    }

    Ok(search.into_solution(Status::MaxIters, config.max_iters))
}
