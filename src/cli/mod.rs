//! CLI module for enjambre
//!
//! Command handlers and output helpers for the `enjambre` binary.

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::LogLevel;

// Re-export Cli from config for convenience
pub use crate::config::Cli;
