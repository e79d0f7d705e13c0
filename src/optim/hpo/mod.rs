//! Hyperparameter Optimization Module
//!
//! Particle swarm search over mixed continuous/categorical spaces, with online
//! median pruning and complexity-aware regularization.
//!
//! # Pipeline
//!
//! Every generation the engine decodes each particle's position into a
//! [`Trial`], evaluates all trials concurrently, regularizes the scores,
//! updates personal and global bests, and moves the swarm.
//!
//! # Example
//!
//! ```
//! use enjambre::optim::hpo::{
//!     Direction, EvaluationError, HyperparameterSpace, MedianPruner, ParameterDomain, PsoConfig,
//!     PsoEngine, Trial,
//! };
//!
//! let mut space = HyperparameterSpace::new();
//! space.add("x", ParameterDomain::continuous(-5.0, 5.0)).unwrap();
//!
//! let objective = |trial: &mut Trial| -> Result<f64, EvaluationError> {
//!     let x = trial.param_f64("x").unwrap_or_default();
//!     Ok(x * x)
//! };
//!
//! let config = PsoConfig::new(6, 4).with_direction(Direction::Minimize).with_seed(1);
//! let mut engine = PsoEngine::new(space, config, objective)
//!     .unwrap()
//!     .with_pruner(MedianPruner::default());
//! let result = engine.run(|_| {}).unwrap();
//! assert_eq!(result.generations(), 4);
//! ```
//!
//! # References
//!
//! \[1\] Kennedy & Eberhart (1995) - Particle Swarm Optimization
//! \[2\] Clerc & Kennedy (2002) - The particle swarm: explosion, stability, and convergence

pub mod benchmarks;
mod encoder;
mod error;
pub mod pruner;
pub mod pso;
pub mod regularizer;
pub mod swarm;
mod types;

pub use benchmarks::{BackboneSurrogate, BuiltinObjective, MlpSurrogate};
pub use encoder::{bin_index, HyperparameterEncoder};
pub use error::{HPOError, Result};
pub use pruner::{MedianPruner, NopPruner, PruneQuery, Pruner, PruningHistory};
pub use pso::{
    BestSnapshot, EvaluationError, GenerationReport, Objective, PsoConfig, PsoEngine, PsoResult,
    SharedBest, Termination,
};
pub use regularizer::{
    Architecture, ArchitectureKind, Regularizer, StageRegularizer, WidthRegularizer,
};
pub use swarm::{Particle, Swarm, SwarmCoefficients};
pub use types::{
    Direction, HyperparameterSpace, HyperparameterSpec, ParameterDomain, ParameterValue, Trial,
    TrialState, UserAttr, NETWORK_ATTR,
};
