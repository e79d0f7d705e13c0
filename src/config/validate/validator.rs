//! Study validation logic

use super::error::ValidationError;
use crate::config::schema::{RegularizerSpec, StudySpec};
use crate::tracking::check_study_name;

fn check_coefficient(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidCoefficient(name, value));
    }
    Ok(())
}

/// Validate a study specification
///
/// Checks:
/// - The study name is usable as a file name prefix
/// - Every parameter has a consistent type, bounds and choices
/// - Swarm, pruner and regularizer settings are in range
/// - The objective is known and attaches the architecture the regularizer scores
pub fn validate_spec(spec: &StudySpec) -> Result<(), ValidationError> {
    if check_study_name(&spec.name).is_err() {
        return Err(ValidationError::InvalidStudyName(spec.name.clone()));
    }

    // Search space
    if spec.space.is_empty() {
        return Err(ValidationError::EmptySpace);
    }
    if let Some(name) = spec.duplicate_names().first() {
        return Err(ValidationError::DuplicateParameter((*name).to_string()));
    }
    for param in &spec.space {
        param.check()?;
    }

    // Swarm
    let swarm = &spec.swarm;
    if swarm.num_particles == 0 {
        return Err(ValidationError::InvalidParticles(swarm.num_particles));
    }
    if swarm.max_generations == 0 {
        return Err(ValidationError::InvalidGenerations(swarm.max_generations));
    }
    check_coefficient("inertia", swarm.inertia)?;
    check_coefficient("cognitive", swarm.cognitive)?;
    check_coefficient("social", swarm.social)?;
    if !swarm.velocity_scale.is_finite() || swarm.velocity_scale <= 0.0 {
        return Err(ValidationError::InvalidVelocityScale(swarm.velocity_scale));
    }
    if swarm.workers == Some(0) {
        return Err(ValidationError::InvalidWorkers);
    }
    if swarm.stagnation_patience == Some(0) {
        return Err(ValidationError::InvalidPatience);
    }

    // Pruner
    if let Some(pruner) = &spec.pruner {
        if pruner.interval_steps == 0 {
            return Err(ValidationError::InvalidPrunerSetting("interval_steps"));
        }
        if pruner.min_trials_per_step == 0 {
            return Err(ValidationError::InvalidPrunerSetting("min_trials_per_step"));
        }
    }

    // Regularizer
    if let Some(regularizer) = &spec.regularizer {
        let lambda = regularizer.lambda();
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ValidationError::InvalidLambda(lambda));
        }
        match *regularizer {
            RegularizerSpec::Width { max_depth: 0, .. } => {
                return Err(ValidationError::InvalidRegularizerLimit("max_depth"));
            }
            RegularizerSpec::Width { max_width: 0, .. } => {
                return Err(ValidationError::InvalidRegularizerLimit("max_width"));
            }
            RegularizerSpec::Stage { max_sum_widths: 0, .. } => {
                return Err(ValidationError::InvalidRegularizerLimit("max_sum_widths"));
            }
            _ => {}
        }
    }

    // Objective and output
    let objective = spec.objective.build()?;
    if let Some(regularizer) = &spec.regularizer {
        let expected = regularizer.architecture_kind();
        match objective.architecture_kind() {
            None => {
                return Err(ValidationError::RegularizerWithoutArchitecture(
                    objective.name().to_string(),
                ));
            }
            Some(produced) if produced != expected => {
                return Err(ValidationError::IncompatibleRegularizer {
                    objective: objective.name().to_string(),
                    produced,
                    expected,
                });
            }
            Some(_) => {}
        }
    }
    if spec.output.metric_to_follow.as_deref().is_some_and(|m| m.trim().is_empty()) {
        return Err(ValidationError::EmptyMetric);
    }

    Ok(())
}
