//! Validation error types
//!
//! Every way a study specification can be rejected before the first trial runs.

use crate::optim::hpo::ArchitectureKind;

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid study name: {0:?} (must be non-empty, without path separators)")]
    InvalidStudyName(String),

    #[error("Search space is empty")]
    EmptySpace,

    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    #[error("Parameter {0}: both low and high are required")]
    MissingBounds(String),

    #[error("Parameter {name}: invalid bounds [{low}, {high}] (must be finite with low < high)")]
    InvalidBounds { name: String, low: f64, high: f64 },

    #[error("Parameter {0}: categorical parameters need at least one choice")]
    EmptyChoices(String),

    #[error("Parameter {0}: choices are only valid for categorical parameters")]
    UnexpectedChoices(String),

    #[error("Invalid particle count: {0} (must be > 0)")]
    InvalidParticles(usize),

    #[error("Invalid generation count: {0} (must be > 0)")]
    InvalidGenerations(usize),

    #[error("Invalid {0} coefficient: {1} (must be finite and >= 0)")]
    InvalidCoefficient(&'static str, f64),

    #[error("Invalid velocity scale: {0} (must be finite and > 0)")]
    InvalidVelocityScale(f64),

    #[error("Invalid worker count: 0 (omit the field to use all cores)")]
    InvalidWorkers,

    #[error("Invalid stagnation patience: 0 (must be > 0)")]
    InvalidPatience,

    #[error("Invalid pruner {0}: 0 (must be > 0)")]
    InvalidPrunerSetting(&'static str),

    #[error("Invalid regularizer lambda: {0} (must be finite and > 0; omit the regularizer to disable it)")]
    InvalidLambda(f64),

    #[error("Invalid regularizer {0}: 0 (must be > 0)")]
    InvalidRegularizerLimit(&'static str),

    #[error(
        "Unknown objective: {0} (must be one of: sphere, rastrigin, mlp-surrogate, backbone-surrogate)"
    )]
    UnknownObjective(String),

    #[error("Objective {objective} produces {produced}, but the regularizer scores {expected}")]
    IncompatibleRegularizer {
        objective: String,
        produced: ArchitectureKind,
        expected: ArchitectureKind,
    },

    #[error("Objective {0} attaches no architecture for the regularizer to score")]
    RegularizerWithoutArchitecture(String),

    #[error("Metric to follow cannot be empty")]
    EmptyMetric,
}
