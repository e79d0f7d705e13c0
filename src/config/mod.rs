//! Declarative study configuration
//!
//! A study file names the search space, the swarm, an optional median pruner
//! and regularizer, the objective, and where results go. Files are validated
//! in full before the engine is built.

mod cli;
mod loader;
pub mod schema;
mod study;
pub mod validate;

pub use cli::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, RunArgs, ValidateArgs,
};
pub use loader::{load_spec, parse_spec};
pub use schema::{
    ObjectiveSpec, OutputSpec, ParamSpec, ParamType, PrunerSpec, RegularizerSpec, StudySpec,
};
pub use study::{build_engine, run_study, run_study_from_yaml};
pub use validate::{validate_spec, ValidationError};
