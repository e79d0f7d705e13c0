//! Study file loading

use std::fs;
use std::path::Path;

use super::schema::StudySpec;
use super::validate::validate_spec;
use crate::error::{Error, Result};

/// Parse and validate a study from YAML text
pub fn parse_spec(yaml: &str) -> Result<StudySpec> {
    let spec: StudySpec = serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML study: {e}")))?;
    validate_spec(&spec)?;
    Ok(spec)
}

/// Load and validate a study file
pub fn load_spec<P: AsRef<Path>>(path: P) -> Result<StudySpec> {
    let yaml = fs::read_to_string(path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read study file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    parse_spec(&yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ParamType, RegularizerSpec};
    use crate::config::validate::ValidationError;
    use crate::optim::hpo::{BuiltinObjective, Direction, ParameterDomain, Regularizer};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STUDY: &str = r"
name: mnist_pso
space:
  - name: hidden_layer_n1_size
    type: continuous
    low: 0
    high: 256
  - name: learning_rate
    type: continuous
    low: 0.0001
    high: 0.1
  - name: optimizer
    type: categorical
    choices: [adam, sgd, rmsprop]
swarm:
  num_particles: 8
  max_generations: 5
  direction: maximize
  seed: 7
pruner:
  n_warmup_steps: 2
regularizer:
  type: width
  lambda: 0.05
  max_depth: 1
  max_width: 256
objective:
  name: mlp-surrogate
  surrogate:
    max_hidden_layers: 1
    max_epochs: 10
output:
  csv_dir: out/csv
  txt_dir: out/txt
  session: 2
  metric_to_follow: accuracy
";

    #[test]
    fn test_parse_full_study() {
        let spec = parse_spec(STUDY).unwrap();
        assert_eq!(spec.name, "mnist_pso");
        assert_eq!(spec.space.len(), 3);
        assert_eq!(spec.space[2].kind, ParamType::Categorical);
        assert_eq!(spec.swarm.num_particles, 8);
        assert_eq!(spec.swarm.seed, 7);
        assert_eq!(spec.swarm.direction, Direction::Maximize);
        // Unset swarm fields keep their defaults
        assert!((spec.swarm.velocity_scale - 0.1).abs() < 1e-12);

        let pruner = spec.pruner.as_ref().unwrap();
        assert_eq!(pruner.n_warmup_steps, 2);
        assert_eq!(pruner.n_startup_generations, 3);
        assert!(pruner.exempt_best);

        assert!(matches!(spec.regularizer, Some(RegularizerSpec::Width { max_depth: 1, .. })));
        assert_eq!(spec.output.session, 2);
        assert_eq!(spec.output.metric_to_follow.as_deref(), Some("accuracy"));

        match spec.objective.build().unwrap() {
            BuiltinObjective::MlpSurrogate(s) => {
                assert_eq!(s.max_epochs, 10);
                assert_eq!(s.input_size, 784);
            }
            other => panic!("unexpected objective {other}"),
        }
    }

    #[test]
    fn test_build_space_keeps_order_and_default_bins() {
        let spec = parse_spec(STUDY).unwrap();
        let space = spec.build_space().unwrap();
        let names: Vec<&str> = space.names().collect();
        assert_eq!(names, ["hidden_layer_n1_size", "learning_rate", "optimizer"]);
        assert_eq!(
            space.get("optimizer"),
            Some(&ParameterDomain::categorical(&["adam", "sgd", "rmsprop"]))
        );
    }

    #[test]
    fn test_minimal_study_defaults() {
        let spec = parse_spec(
            "name: tiny\nspace:\n  - {name: x, type: continuous, low: -1, high: 1}\nobjective: {name: sphere}\n",
        )
        .unwrap();
        assert!(spec.pruner.is_none());
        assert!(spec.regularizer.is_none());
        assert_eq!(spec.swarm.num_particles, 10);
        assert_eq!(spec.output.session, 1);
    }

    #[test]
    fn test_stage_regularizer_default_normalizer() {
        let yaml = STUDY
            .replace(
                "  type: width\n  lambda: 0.05\n  max_depth: 1\n  max_width: 256\n",
                "  type: stage\n  lambda: 0.1\n",
            )
            .replace("name: mlp-surrogate", "name: backbone-surrogate");
        let spec = parse_spec(&yaml).unwrap();
        assert_eq!(
            spec.regularizer,
            Some(RegularizerSpec::Stage { lambda: 0.1, max_sum_widths: 1024 })
        );
        assert_eq!(spec.regularizer.unwrap().build().unwrap().name(), "StageRegularizer");
    }

    #[test]
    fn test_stage_regularizer_with_layer_objective_is_rejected() {
        let yaml = STUDY.replace(
            "  type: width\n  lambda: 0.05\n  max_depth: 1\n  max_width: 256\n",
            "  type: stage\n  lambda: 0.1\n",
        );
        let err = parse_spec(&yaml).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::IncompatibleRegularizer { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = parse_spec("name: [unclosed").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err = parse_spec("name: x\nspace: []\nobjective: {name: sphere}\n").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_load_spec_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(STUDY.as_bytes()).unwrap();
        let spec = load_spec(file.path()).unwrap();
        assert_eq!(spec.name, "mnist_pso");

        let err = load_spec("/nonexistent/study.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read study file"));
    }
}
