// Domain errors raised before any computation takes place
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resistance series is empty")]
    EmptySeries,
}

impl EvaluationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        EvaluationError::InvalidInput(message.into())
    }
}
