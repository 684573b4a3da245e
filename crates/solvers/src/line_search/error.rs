use std::error::Error as StdError;

use super::ConfigError;

/// Errors that can occur during a line search.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid line search config: {0}")]
    Config(#[from] ConfigError),

    #[error("merit function is infeasible or not finite at zero")]
    NonFiniteStart,

    #[error("no decrease found after {halvings} halvings")]
    NoDescent { halvings: usize },

    #[error("no bracket found after {expansions} expansions")]
    BracketNotFound { expansions: usize },

    #[error("evaluation failed: {0}")]
    Evaluation(Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(super) fn evaluation(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Evaluation(err.into())
    }
}
