//! Particle swarm optimization engine

mod config;
mod engine;

pub use config::PsoConfig;
pub use engine::{
    BestSnapshot, EvaluationError, GenerationReport, Objective, PsoEngine, PsoResult, SharedBest,
    Termination,
};
