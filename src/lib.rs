//! Enjambre: particle-swarm hyperparameter search
//!
//! Searches a mixed continuous/categorical hyperparameter space with a
//! generation-synchronized particle swarm, abandons unpromising trials online
//! with a median pruner, and penalizes oversized architectures before scores
//! are compared.
//!
//! # Example
//!
//! ```
//! use enjambre::optim::hpo::{
//!     Direction, EvaluationError, HyperparameterSpace, ParameterDomain, PsoConfig, PsoEngine,
//!     Trial,
//! };
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut space = HyperparameterSpace::new();
//! space.add("x", ParameterDomain::continuous(-5.0, 5.0))?;
//! space.add("act", ParameterDomain::categorical(&["relu", "tanh"]))?;
//!
//! let config = PsoConfig::new(4, 3).with_direction(Direction::Minimize).with_seed(7);
//! let objective = |trial: &mut Trial| -> Result<f64, EvaluationError> {
//!     let x = trial.param_f64("x").unwrap_or(0.0);
//!     Ok(x * x)
//! };
//!
//! let mut engine = PsoEngine::new(space, config, objective)?;
//! let result = engine.run(|_report| {})?;
//! assert_eq!(result.reports.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod optim;
pub mod tracking;

pub use error::{Error, Result};
