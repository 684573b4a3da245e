use std::error::Error as StdError;

use thiserror::Error;

use crate::{line_search, linear};

use super::ConfigError;

/// Errors that can occur while constructing or running an inverse solver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("model error: {0}")]
    Model(Box<dyn StdError + Send + Sync>),

    #[error("forward solve diverged: {reason}")]
    ForwardDiverged { reason: String },

    #[error("gradient is not finite")]
    NonFiniteGradient,

    #[error("{operator} is {found:?}, expected {expected:?}")]
    Shape {
        operator: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("linear solve failed: {0}")]
    Linear(#[from] linear::Error),

    #[error("line search bracketing failed: {0}")]
    Bracket(line_search::Error),

    #[error("line search failed: {message}")]
    LineSearch { message: String },

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn model(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Model(Box::new(err))
    }
}

impl From<line_search::Error> for Error {
    /// Unwraps errors raised inside line search trials.
    fn from(err: line_search::Error) -> Self {
        match err {
            line_search::Error::Evaluation(source) => match source.downcast::<Self>() {
                Ok(err) => *err,
                Err(source) => Self::Model(source),
            },
            err => Self::Bracket(err),
        }
    }
}
