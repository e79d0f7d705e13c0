//! Study execution from a validated specification

use std::path::Path;
use std::sync::Arc;

use super::loader::load_spec;
use super::schema::StudySpec;
use super::validate::validate_spec;
use crate::error::Result;
use crate::optim::hpo::{PsoEngine, PsoResult};
use crate::tracking::{PsoRunner, SessionLog};

/// Build an engine with the study's space, swarm, objective, pruner and regularizer
pub fn build_engine(spec: &StudySpec) -> Result<PsoEngine> {
    let space = spec.build_space()?;
    let objective = spec.objective.build()?;
    let mut engine = PsoEngine::new(space, spec.swarm.clone(), objective)?;
    if let Some(pruner) = &spec.pruner {
        engine = engine.with_pruner(pruner.build()?);
    }
    if let Some(regularizer) = &spec.regularizer {
        engine = engine.with_boxed_regularizer(regularizer.build()?);
    }
    Ok(engine)
}

/// Run a study to termination, writing its CSV, TXT summary and session log
pub fn run_study(spec: &StudySpec) -> Result<PsoResult> {
    validate_spec(spec)?;
    let mut engine = build_engine(spec)?;

    let output = &spec.output;
    let mut runner = PsoRunner::new(&output.csv_dir, &output.txt_dir, output.session);
    if let Some(metric) = &output.metric_to_follow {
        runner = runner.with_metric_to_follow(metric);
    }
    if let Some(path) = &output.log_file {
        runner = runner.with_session_log(Arc::new(SessionLog::create(path)?));
    }

    log::info!(
        "Running study {} ({} particles x {} generations, objective {})",
        spec.name,
        spec.swarm.num_particles,
        spec.swarm.max_generations,
        spec.objective.name
    );
    Ok(runner.run(&mut engine, &spec.name)?)
}

/// Load a study file and run it
pub fn run_study_from_yaml<P: AsRef<Path>>(path: P) -> Result<PsoResult> {
    let spec = load_spec(path)?;
    run_study(&spec)
}
