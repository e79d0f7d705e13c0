//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! enjambre run study.yaml
//! enjambre run study.yaml --generations 20 --particles 16 --output-dir ./results
//! enjambre validate study.yaml --detailed
//! enjambre info study.yaml --format json
//! ```

mod core;
mod types;


pub use core::{apply_overrides, parse_args, Cli, Command, InfoArgs, RunArgs, ValidateArgs};
pub use types::OutputFormat;
