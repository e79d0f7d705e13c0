//! Search algorithms

pub mod hpo;

pub use hpo::{
    Direction, HPOError, HyperparameterSpace, MedianPruner, ParameterDomain, ParameterValue,
    PsoConfig, PsoEngine, PsoResult, Trial, TrialState,
};
