//! CLI command implementations

mod info;
mod run;
mod validate;

#[cfg(test)]
mod tests;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);

    match cli.command {
        Command::Run(args) => run::run_study_command(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
    }
}
