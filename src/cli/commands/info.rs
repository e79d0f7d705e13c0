//! Info command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_spec, InfoArgs, OutputFormat};

use super::validate::{
    format_pruner_info, format_regularizer_info, format_space_info, format_swarm_info,
};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_spec(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Study Info:");
            println!();
            println!("Study: {}", spec.name);
            println!("Objective: {}", spec.objective.name);
            println!("Search space:");
            println!("{}", format_space_info(&spec));
            println!("Swarm:");
            println!("{}", format_swarm_info(&spec));
            match format_pruner_info(&spec) {
                Some(info) => println!("{info}"),
                None => println!("Pruner: none"),
            }
            match format_regularizer_info(&spec) {
                Some(info) => println!("{info}"),
                None => println!("Regularizer: none"),
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&spec)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
