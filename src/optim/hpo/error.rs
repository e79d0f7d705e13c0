//! HPO error types

use thiserror::Error;

/// HPO errors
#[derive(Debug, Error)]
pub enum HPOError {
    #[error("Empty search space")]
    EmptySpace,

    #[error("Invalid search space for {0}: {1}")]
    InvalidSpec(String, String),

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Invalid parameter value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Encoded vector has length {got}, search space has {expected} dimensions")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Out-of-order report: step {step} is not after last reported step {last}")]
    OutOfOrderReport { step: usize, last: usize },

    #[error("Evaluation failed: {0}")]
    EvaluationFailure(String),

    #[error("Pruning policy violation: {0}")]
    PruningPolicyViolation(String),

    #[error("Invalid swarm configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),
}

/// Result type for HPO operations
pub type Result<T> = std::result::Result<T, HPOError>;
