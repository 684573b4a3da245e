use invert_core::Field;
use tracing::{trace, warn};

use crate::linear::{self, SolverParameters};

use super::{Config, GaussNewtonOperator};

/// Why the inner conjugate gradient iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcgStatus {
    /// The quadratic model stopped improving, or the residual vanished.
    Converged,

    /// The iteration limit was reached; the last iterate was kept.
    MaxIterations,

    /// The operator was not positive along a search direction.
    Breakdown,
}

/// Summary of the most recent inner conjugate gradient solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcgReport {
    /// Why the iteration stopped.
    pub status: PcgStatus,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Quadratic model cost `½ qᵀHq + dJᵀq` at the returned direction.
    pub cost: f64,
}

/// Solves `H q = −dJ` by conjugate gradients preconditioned with `M`.
///
/// Stops once the quadratic model cost changes by less than
/// `search_tolerance` relative to half the energy norm of `q`.
pub(super) fn solve(
    operator: &GaussNewtonOperator<'_>,
    gradient: &Field,
    config: &Config,
    params: &SolverParameters,
) -> Result<(Field, PcgReport), linear::Error> {
    let m = gradient.len();
    let precond = operator.preconditioner();
    let m_norm = |z: &Field| z.dot(&(&precond * z));
    let apply_inverse = |rhs: &Field| linear::solve(&precond, rhs, None, params);

    let mut q = Field::zeros(m);
    let mut z = apply_inverse(&(-gradient))?;
    let mut s = z.clone();

    let mut z_mnorm = m_norm(&z);
    let initial_mnorm = z_mnorm;
    if !(initial_mnorm > 0.0) {
        let report = PcgReport {
            status: PcgStatus::Converged,
            iterations: 0,
            cost: 0.0,
        };
        return Ok((q, report));
    }

    let mut old_cost = f64::INFINITY;
    for iteration in 1..=config.max_iterations {
        let g = operator.mult(&s)?;
        let s_hnorm = s.dot(&g);
        if !s_hnorm.is_finite() || s_hnorm <= 0.0 {
            warn!(iteration, s_hnorm, "Gauss-Newton operator is not positive definite");
            let (direction, cost) = if iteration == 1 {
                let cost = model_cost(operator, gradient, &s)?;
                (s, cost)
            } else {
                (q, old_cost)
            };
            let report = PcgReport {
                status: PcgStatus::Breakdown,
                iterations: iteration,
                cost,
            };
            return Ok((direction, report));
        }

        let alpha = z_mnorm / s_hnorm;
        let delta_z = apply_inverse(&g)?;

        q.axpy(alpha, &s, 1.0);
        z.axpy(-alpha, &delta_z, 1.0);

        let new_mnorm = m_norm(&z);
        let beta = new_mnorm / z_mnorm;
        s = &z + &s * beta;
        z_mnorm = new_mnorm;

        let energy_norm = operator.energy_norm(&q)?;
        let cost = 0.5 * energy_norm + gradient.dot(&q);
        trace!(iteration, cost, residual = z_mnorm, "pcg");

        let vanished = z_mnorm <= f64::EPSILON * initial_mnorm;
        let stalled = (old_cost - cost).abs() / (0.5 * energy_norm) < config.search_tolerance;
        if vanished || stalled {
            let report = PcgReport {
                status: PcgStatus::Converged,
                iterations: iteration,
                cost,
            };
            return Ok((q, report));
        }
        old_cost = cost;
    }

    warn!(
        max_iterations = config.max_iterations,
        "Gauss-Newton search direction did not converge, keeping last iterate"
    );
    let report = PcgReport {
        status: PcgStatus::MaxIterations,
        iterations: config.max_iterations,
        cost: old_cost,
    };
    Ok((q, report))
}

fn model_cost(
    operator: &GaussNewtonOperator<'_>,
    gradient: &Field,
    q: &Field,
) -> Result<f64, linear::Error> {
    Ok(0.5 * operator.energy_norm(q)? + gradient.dot(q))
}
