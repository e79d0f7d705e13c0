//! Study tracking and persistence
//!
//! Records what the swarm did: one row per trial per generation, a
//! human-readable summary at the end of the run, and a free-form session log
//! objectives can write to. Persistence goes through the
//! [`RecordSink`](storage::RecordSink) trait.
//!
//! # Architecture
//!
//! - **`PsoRunner`**: drives an engine once and forwards each generation to a sink
//! - **`RecordSink`**: pluggable persistence (CSV + TXT files, in-memory)
//! - **`SessionLog`**: append-only experiment log shared with objectives
//!
//! # Example
//!
//! ```
//! use enjambre::optim::hpo::{
//!     EvaluationError, HyperparameterSpace, ParameterDomain, PsoConfig, PsoEngine, Trial,
//! };
//! use enjambre::tracking::storage::InMemorySink;
//! use enjambre::tracking::PsoRunner;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut space = HyperparameterSpace::new();
//! space.add("x", ParameterDomain::continuous(0.0, 1.0))?;
//! let objective = |trial: &mut Trial| -> Result<f64, EvaluationError> {
//!     Ok(trial.param_f64("x").unwrap_or_default())
//! };
//! let mut engine = PsoEngine::new(space, PsoConfig::new(3, 2), objective)?;
//!
//! let mut runner = PsoRunner::with_sink(InMemorySink::new(), 1);
//! let result = runner.run(&mut engine, "demo")?;
//! assert_eq!(result.generations(), 2);
//! assert_eq!(runner.sink().records().len(), 6);
//! # Ok(())
//! # }
//! ```

pub mod runner;
pub mod session_log;
pub mod storage;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::optim::hpo::{HPOError, Trial, TrialState};

pub use runner::PsoRunner;
pub use session_log::SessionLog;
pub use storage::{CsvTxtSink, InMemorySink, RecordSink, StudySummary};

/// Errors from tracking operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Search failed: {0}")]
    Engine(#[from] HPOError),

    #[error("Invalid study name: {0}")]
    InvalidStudyName(String),
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Flat, serializable view of an archived trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub generation: usize,
    pub particle_id: usize,
    /// Decoded hyperparameters, rendered as text
    pub params: BTreeMap<String, String>,
    /// Regularized score
    pub score: Option<f64>,
    /// Score as returned by the objective
    pub raw_score: Option<f64>,
    pub state: TrialState,
    pub user_attrs: BTreeMap<String, String>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
    pub datetime_start: String,
    pub datetime_complete: Option<String>,
}

/// Timestamp format used in records and logs
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

impl From<&Trial> for TrialRecord {
    fn from(trial: &Trial) -> Self {
        Self {
            generation: trial.generation,
            particle_id: trial.particle_id,
            params: trial.params.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
            score: trial.score(),
            raw_score: trial.raw_score(),
            state: trial.state(),
            user_attrs: trial
                .user_attrs()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            error: trial.error().map(String::from),
            duration_ms: trial.duration_ms(),
            datetime_start: trial.datetime_start().format(DATETIME_FORMAT).to_string(),
            datetime_complete: trial
                .datetime_complete()
                .map(|t| t.format(DATETIME_FORMAT).to_string()),
        }
    }
}

/// Reject study names that would escape the output directories
pub(crate) fn check_study_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.contains(['/', '\\'])
        || name == "."
        || name == ".."
        || name.chars().any(char::is_control);
    if bad {
        return Err(TrackingError::InvalidStudyName(name.to_string()));
    }
    Ok(())
}
