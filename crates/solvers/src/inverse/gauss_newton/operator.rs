use invert_core::{Field, Operator};

use crate::linear::{self, DirichletBc, SolverParameters};

use super::super::Linearization;

/// The Gauss-Newton approximation `H` to the Hessian of the objective.
///
/// `H = (dF/dp)ᵀ (dF/du)⁻ᵀ d²E (dF/du)⁻¹ (dF/dp) + d²R`, applied matrix-free
/// through linear solves with the state Jacobian. Second derivatives of the
/// forward model are dropped.
#[derive(Debug, Clone)]
pub struct GaussNewtonOperator<'a> {
    linearization: Linearization,
    bc: &'a DirichletBc,
    params: &'a SolverParameters,
}

impl<'a> GaussNewtonOperator<'a> {
    #[must_use]
    pub fn new(
        linearization: Linearization,
        bc: &'a DirichletBc,
        params: &'a SolverParameters,
    ) -> Self {
        Self {
            linearization,
            bc,
            params,
        }
    }

    /// The preconditioner `mass + d²R`.
    #[must_use]
    pub fn preconditioner(&self) -> Operator {
        &self.linearization.mass + &self.linearization.regularization_hessian
    }

    /// Applies `H` to `q`, using two linear solves.
    ///
    /// # Errors
    ///
    /// Propagates the linear solver's error.
    pub fn mult(&self, q: &Field) -> Result<Field, linear::Error> {
        let lin = &self.linearization;
        let w = self.tangent(q)?;
        let v = linear::solve(
            &lin.state_jacobian.transpose(),
            &(&lin.objective_hessian * &w),
            Some(self.bc),
            self.params,
        )?;
        Ok(lin.parameter_jacobian.tr_mul(&v) + &lin.regularization_hessian * q)
    }

    /// Computes `qᵀ H q`, using one linear solve.
    ///
    /// # Errors
    ///
    /// Propagates the linear solver's error.
    pub fn energy_norm(&self, q: &Field) -> Result<f64, linear::Error> {
        let lin = &self.linearization;
        let w = self.tangent(q)?;
        Ok(w.dot(&(&lin.objective_hessian * &w)) + q.dot(&(&lin.regularization_hessian * q)))
    }

    /// Solves `dF/du · w = dF/dp · q`.
    fn tangent(&self, q: &Field) -> Result<Field, linear::Error> {
        let lin = &self.linearization;
        linear::solve(
            &lin.state_jacobian,
            &(&lin.parameter_jacobian * q),
            Some(self.bc),
            self.params,
        )
    }
}
