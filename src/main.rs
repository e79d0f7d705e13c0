//! Enjambre CLI
//!
//! Particle-swarm hyperparameter search driven by a YAML study file.
//!
//! # Usage
//!
//! ```bash
//! # Run a study
//! enjambre run study.yaml
//!
//! # Run with overrides
//! enjambre run study.yaml --generations 20 --particles 16 --seed 7
//!
//! # Validate a study
//! enjambre validate study.yaml --detailed
//!
//! # Show study info
//! enjambre info study.yaml --format yaml
//! ```

use clap::Parser;
use enjambre::cli::{run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::from_flags(cli.quiet, cli.verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.env_filter()))
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
