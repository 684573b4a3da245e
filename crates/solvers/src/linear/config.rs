use thiserror::Error;

/// Krylov method used by a linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Ksp {
    /// Apply the preconditioner once; with [`Pc::Lu`] this is a direct solve.
    PreOnly,

    /// Preconditioned conjugate gradients, for symmetric positive definite systems.
    Cg,
}

/// Preconditioner used by a linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pc {
    /// Full LU factorization.
    Lu,

    /// Diagonal scaling.
    Jacobi,

    /// No preconditioning.
    None,
}

/// Errors that can occur when validating linear solver parameters.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ksp `preonly` requires pc `lu`, got {0:?}")]
    PreOnly(Pc),

    #[error("ksp `cg` does not support pc `lu`")]
    CgWithLu,

    #[error("rtol must be finite and non-negative")]
    Rtol,

    #[error("atol must be finite and non-negative")]
    Atol,
}

/// Parameters selecting how a linear system is solved.
///
/// The tolerances and iteration limit only apply to iterative methods.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverParameters {
    pub ksp: Ksp,
    pub pc: Pc,
    pub rtol: f64,
    pub atol: f64,
    pub max_iters: usize,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self::direct()
    }
}

impl SolverParameters {
    /// A direct LU solve.
    #[must_use]
    pub fn direct() -> Self {
        Self {
            ksp: Ksp::PreOnly,
            pc: Pc::Lu,
            rtol: 1e-10,
            atol: 1e-50,
            max_iters: 10_000,
        }
    }

    /// Conjugate gradients with the given preconditioner and default tolerances.
    #[must_use]
    pub fn cg(pc: Pc) -> Self {
        Self {
            ksp: Ksp::Cg,
            pc,
            ..Self::direct()
        }
    }

    /// Validates that the method/preconditioner pair is supported and that
    /// tolerances are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.ksp, self.pc) {
            (Ksp::PreOnly, Pc::Lu) | (Ksp::Cg, Pc::Jacobi | Pc::None) => {}
            (Ksp::PreOnly, pc) => return Err(ConfigError::PreOnly(pc)),
            (Ksp::Cg, Pc::Lu) => return Err(ConfigError::CgWithLu),
        }
        if !self.rtol.is_finite() || self.rtol < 0.0 {
            return Err(ConfigError::Rtol);
        }
        if !self.atol.is_finite() || self.atol < 0.0 {
            return Err(ConfigError::Atol);
        }
        Ok(())
    }
}
