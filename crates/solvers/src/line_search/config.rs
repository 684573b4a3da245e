use thiserror::Error;

/// Configuration for the line search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Maximum number of step halvings when looking for a decrease.
    pub max_halvings: usize,

    /// Maximum number of downhill expansions when bracketing.
    pub max_expansions: usize,

    /// Maximum number of golden section iterations.
    pub max_iters: usize,

    /// Absolute tolerance on the step length.
    pub x_abs_tol: f64,

    /// Relative tolerance on the step length.
    pub x_rel_tol: f64,
}

/// Errors that can occur when validating a line search config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("x_abs_tol must be finite and non-negative")]
    XAbs,

    #[error("x_rel_tol must be finite and non-negative")]
    XRel,

    #[error("at least one halving must be allowed")]
    Halvings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_halvings: 60,
            max_expansions: 50,
            max_iters: 500,
            x_abs_tol: 1e-11,
            x_rel_tol: 1.48e-8,
        }
    }
}

impl Config {
    /// Returns the default config with the given relative step tolerance.
    #[must_use]
    pub fn with_x_rel_tol(x_rel_tol: f64) -> Self {
        Self {
            x_rel_tol,
            ..Self::default()
        }
    }

    /// Validates the tolerances and limits.
    ///
    /// # Errors
    ///
    /// Returns an error if any tolerance is negative or non-finite, or if no
    /// halving is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.x_abs_tol.is_finite() || self.x_abs_tol < 0.0 {
            return Err(ConfigError::XAbs);
        }
        if !self.x_rel_tol.is_finite() || self.x_rel_tol < 0.0 {
            return Err(ConfigError::XRel);
        }
        if self.max_halvings == 0 {
            return Err(ConfigError::Halvings);
        }
        Ok(())
    }
}
