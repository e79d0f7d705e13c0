//! CLI command tests

use super::*;
use super::validate;
use crate::cli::LogLevel;
use crate::config::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a small sphere study whose outputs land inside `dir`
fn create_test_study(dir: &TempDir) -> PathBuf {
    let study_path = dir.path().join("study.yaml");
    let out = dir.path().join("out");

    let study = format!(
        r"
name: sphere_test
space:
  - name: x
    type: continuous
    low: -5
    high: 5
  - name: y
    type: continuous
    low: -5
    high: 5
swarm:
  num_particles: 4
  max_generations: 3
  direction: minimize
  workers: 2
objective:
  name: sphere
output:
  csv_dir: {}
  txt_dir: {}
  session: 1
  log_file: {}
",
        out.join("csv").display(),
        out.join("txt").display(),
        out.join("log").join("session.log").display()
    );

    std::fs::write(&study_path, study).unwrap();
    study_path
}

fn run_args(config: &Path) -> RunArgs {
    RunArgs {
        config: config.to_path_buf(),
        generations: None,
        particles: None,
        seed: None,
        workers: None,
        objective: None,
        output_dir: None,
        session: None,
    }
}

#[test]
fn test_validate_command_basic() {
    let dir = TempDir::new().unwrap();
    let args = ValidateArgs { config: create_test_study(&dir), detailed: false };
    assert!(validate::run_validate(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_validate_command_detailed() {
    let dir = TempDir::new().unwrap();
    let args = ValidateArgs { config: create_test_study(&dir), detailed: true };
    assert!(validate::run_validate(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_validate_command_missing_file() {
    let args = ValidateArgs { config: PathBuf::from("/nonexistent/study.yaml"), detailed: false };
    let err = validate::run_validate(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Validation failed"));
}

#[test]
fn test_validate_command_invalid_study() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "name: bad\nspace: []\nobjective: {name: sphere}\n").unwrap();
    let err = validate::run_validate(ValidateArgs { config: path, detailed: false }, LogLevel::Quiet)
        .unwrap_err();
    assert!(err.contains("Search space is empty"));
}

#[test]
fn test_info_command_all_formats() {
    let dir = TempDir::new().unwrap();
    let config = create_test_study(&dir);
    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
        let args = InfoArgs { config: config.clone(), format };
        assert!(info::run_info(args, LogLevel::Quiet).is_ok());
    }
}

#[test]
fn test_run_command_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let config = create_test_study(&dir);

    let result = run::run_study_command(run_args(&config), LogLevel::Quiet);
    assert!(result.is_ok(), "{result:?}");

    let out = dir.path().join("out");
    let csv = std::fs::read_to_string(out.join("csv").join("sphere_test_1.csv")).unwrap();
    // Header plus 4 particles x 3 generations
    assert_eq!(csv.lines().count(), 13);
    assert!(csv.starts_with("generation,particle_id,hp_x,hp_y,score"));

    let txt = std::fs::read_to_string(out.join("txt").join("sphere_test_1.txt")).unwrap();
    assert!(txt.contains("Study: sphere_test"));
    assert!(txt.contains("Direction: minimize"));

    let log = std::fs::read_to_string(out.join("log").join("session.log")).unwrap();
    assert!(log.contains("End of Log File."));
}

#[test]
fn test_run_command_overrides() {
    let dir = TempDir::new().unwrap();
    let config = create_test_study(&dir);
    let elsewhere = dir.path().join("elsewhere");

    let mut args = run_args(&config);
    args.generations = Some(2);
    args.particles = Some(3);
    args.objective = Some("rastrigin".to_string());
    args.output_dir = Some(elsewhere.clone());
    args.session = Some(9);
    assert!(run::run_study_command(args, LogLevel::Quiet).is_ok());

    let csv = std::fs::read_to_string(elsewhere.join("csv").join("sphere_test_9.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1 + 3 * 2);
    assert!(elsewhere.join("log").join("session.log").exists());
}

#[test]
fn test_run_command_rejects_invalid_override() {
    let dir = TempDir::new().unwrap();
    let mut args = run_args(&create_test_study(&dir));
    args.particles = Some(0);
    let err = run::run_study_command(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Validation failed"));

    let mut args = run_args(&create_test_study(&dir));
    args.objective = Some("imagenet".to_string());
    let err = run::run_study_command(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Unknown objective"));
}

#[test]
fn test_run_command_dispatch() {
    let dir = TempDir::new().unwrap();
    let config = create_test_study(&dir);
    let cli = parse_args(["enjambre", "--quiet", "validate", config.to_str().unwrap()]).unwrap();
    assert!(run_command(cli).is_ok());

    let cli = parse_args(["enjambre", "-q", "info", "/nonexistent/study.yaml"]).unwrap();
    assert!(run_command(cli).unwrap_err().contains("Config error"));
}
