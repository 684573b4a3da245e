use thiserror::Error;

/// Stopping criteria for [`InverseSolver::solve`](super::InverseSolver::solve).
///
/// The solver stops once the objective `J` is at most `atol`, or once a step
/// improves `J` by less than `rtol · J`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Absolute threshold on the objective.
    pub atol: f64,

    /// Relative improvement below which the iteration has stalled.
    pub rtol: f64,

    /// Maximum number of steps, or `None` for no limit.
    pub max_iterations: Option<usize>,
}

/// Errors that can occur when validating solver configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("atol must be finite and non-negative")]
    Atol,

    #[error("rtol must be finite and non-negative")]
    Rtol,

    #[error("search tolerance must be finite and positive")]
    SearchTolerance,

    #[error("at least one conjugate gradient iteration must be allowed")]
    MaxIterations,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            atol: 0.0,
            rtol: 1e-6,
            max_iterations: None,
        }
    }
}

impl Config {
    /// Returns the default config with the given iteration limit.
    #[must_use]
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            ..Self::default()
        }
    }

    /// Validates the tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if either tolerance is negative or non-finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.atol.is_finite() || self.atol < 0.0 {
            return Err(ConfigError::Atol);
        }
        if !self.rtol.is_finite() || self.rtol < 0.0 {
            return Err(ConfigError::Rtol);
        }
        Ok(())
    }
}
