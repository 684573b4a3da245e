/// The result of evaluating the merit function at a trial step length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trial {
    /// The merit function was evaluated.
    Feasible(f64),

    /// The merit function could not be evaluated, for example because the
    /// forward solve diverged at this step length.
    Infeasible,
}

impl Trial {
    /// Returns the merit value, with infeasible and non-finite trials scored as `+∞`.
    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            Self::Feasible(value) if !value.is_nan() => value,
            _ => f64::INFINITY,
        }
    }
}

impl From<f64> for Trial {
    fn from(value: f64) -> Self {
        Self::Feasible(value)
    }
}
