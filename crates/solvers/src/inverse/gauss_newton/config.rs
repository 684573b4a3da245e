use crate::inverse::ConfigError;

/// Configuration for the Gauss-Newton search direction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Relative change in the quadratic model below which the inner
    /// conjugate gradient iteration stops. Half of it is used as the line
    /// search's relative step tolerance.
    pub search_tolerance: f64,

    /// Maximum number of inner conjugate gradient iterations.
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_tolerance: 1e-3,
            max_iterations: 200,
        }
    }
}

impl Config {
    /// Returns the default config with the given search tolerance.
    #[must_use]
    pub fn with_search_tolerance(search_tolerance: f64) -> Self {
        Self {
            search_tolerance,
            ..Self::default()
        }
    }

    /// Validates the tolerance and iteration limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not finite and positive, or if no
    /// iteration is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.search_tolerance.is_finite() || self.search_tolerance <= 0.0 {
            return Err(ConfigError::SearchTolerance);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::MaxIterations);
        }
        Ok(())
    }
}
