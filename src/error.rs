//! Crate-level error type

use thiserror::Error;

use crate::config::ValidationError;
use crate::optim::hpo::HPOError;
use crate::tracking::TrackingError;

/// Errors surfaced by the public entry points
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid study: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Hpo(#[from] HPOError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;
