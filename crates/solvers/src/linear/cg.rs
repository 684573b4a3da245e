use invert_core::{Field, Operator};
use tracing::trace;

use super::{Error, Pc, SolverParameters};

/// Preconditioned conjugate gradients from a zero initial guess.
///
/// Converges when `‖r‖ ≤ max(atol, rtol · ‖b‖)`.
pub(super) fn solve(
    matrix: &Operator,
    rhs: &Field,
    params: &SolverParameters,
) -> Result<Field, Error> {
    let n = rhs.len();
    let mut x = Field::zeros(n);
    if n == 0 {
        return Ok(x);
    }

    let tol = params.atol.max(params.rtol * rhs.norm());
    let mut r = rhs.clone();
    if r.norm() <= tol {
        return Ok(x);
    }

    let inv_diag = match params.pc {
        Pc::Jacobi => Some(jacobi(matrix)?),
        Pc::None | Pc::Lu => None,
    };
    let precondition = |r: &Field| match &inv_diag {
        Some(d) => r.component_mul(d),
        None => r.clone(),
    };

    let mut z = precondition(&r);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..params.max_iters {
        let ap = matrix * &p;
        let pap = p.dot(&ap);
        if !(pap > 0.0) {
            return Err(Error::Breakdown);
        }

        let alpha = rz / pap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        let residual = r.norm();
        trace!(iter, residual, "cg");
        if residual <= tol {
            return Ok(x);
        }

        z = precondition(&r);
        let rz_new = r.dot(&z);
        p = &z + &p * (rz_new / rz);
        rz = rz_new;
    }

    Err(Error::NotConverged {
        iters: params.max_iters,
        residual: r.norm(),
    })
}

/// Inverse of the diagonal, failing on a non-positive entry.
fn jacobi(matrix: &Operator) -> Result<Field, Error> {
    let diag = matrix.diagonal();
    if diag.iter().any(|&d| !(d > 0.0)) {
        return Err(Error::Breakdown);
    }
    Ok(diag.map(|d| 1.0 / d))
}
