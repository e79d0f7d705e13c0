//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;
use crate::config::schema::StudySpec;

/// Enjambre: particle-swarm hyperparameter search
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "enjambre")]
#[command(version)]
#[command(about = "Particle-swarm hyperparameter search with median pruning and regularization")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a study from a YAML file
    Run(RunArgs),

    /// Validate a study file without running it
    Validate(ValidateArgs),

    /// Display the space, swarm and pruner of a study
    Info(InfoArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Path to YAML study file
    #[arg(value_name = "STUDY")]
    pub config: PathBuf,

    /// Override number of generations
    #[arg(short, long)]
    pub generations: Option<usize>,

    /// Override swarm size
    #[arg(short, long)]
    pub particles: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override worker thread count
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Override the objective (sphere, rastrigin, mlp-surrogate, backbone-surrogate)
    #[arg(long)]
    pub objective: Option<String>,

    /// Write csv/, txt/ and log/ under this directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the session number used in output file names
    #[arg(long)]
    pub session: Option<u32>,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML study file
    #[arg(value_name = "STUDY")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML study file
    #[arg(value_name = "STUDY")]
    pub config: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a StudySpec
///
/// The surrogate settings of the file are kept when `--objective` names a
/// different objective.
pub fn apply_overrides(spec: &mut StudySpec, args: &RunArgs) {
    if let Some(generations) = args.generations {
        spec.swarm.max_generations = generations;
    }
    if let Some(particles) = args.particles {
        spec.swarm.num_particles = particles;
    }
    if let Some(seed) = args.seed {
        spec.swarm.seed = seed;
    }
    if let Some(workers) = args.workers {
        spec.swarm.workers = Some(workers);
    }
    if let Some(objective) = &args.objective {
        spec.objective.name = objective.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        spec.output.relocate(output_dir);
    }
    if let Some(session) = args.session {
        spec.output.session = session;
    }
}
