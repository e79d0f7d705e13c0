//! Run command implementation

use std::collections::BTreeMap;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_spec, run_study, validate_spec, RunArgs, StudySpec};
use crate::optim::hpo::{GenerationReport, PsoResult};

fn format_generation(report: &GenerationReport) -> String {
    let best = report.best_score.map_or_else(|| "-".to_string(), |s| format!("{s:.6}"));
    format!(
        "  Generation {:>3}: {} completed, {} pruned, {} failed, best {best}{}",
        report.generation,
        report.completed,
        report.pruned,
        report.failed,
        if report.improved { " *" } else { "" }
    )
}

/// Format the outcome of a run as a string
pub fn format_result(spec: &StudySpec, result: &PsoResult) -> String {
    let mut lines = vec![format!(
        "Study {} finished: {} after {} generations",
        spec.name,
        result.termination,
        result.generations()
    )];
    match &result.best {
        Some(best) => {
            lines.push(format!(
                "  Best score: {:.6} (generation {}, particle {})",
                best.score, best.generation, best.particle_id
            ));
            let sorted: BTreeMap<_, _> = best.params.iter().collect();
            for (name, value) in sorted {
                lines.push(format!("    {name}: {value}"));
            }
        }
        None => lines.push("  Best score: none (every trial failed)".to_string()),
    }
    lines.push(format!("  Failed trials: {}", result.total_failures));
    lines.push(format!(
        "  Records: {}",
        spec.output.csv_dir.join(format!("{}_{}.csv", spec.name, spec.output.session)).display()
    ));
    lines.push(format!(
        "  Summary: {}",
        spec.output.txt_dir.join(format!("{}_{}.txt", spec.name, spec.output.session)).display()
    ));
    lines.join("\n")
}

pub fn run_study_command(args: RunArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Enjambre: running study {}", args.config.display()),
    );

    let mut spec = load_spec(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    validate_spec(&spec).map_err(|e| format!("Validation failed: {e}"))?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Swarm: {} particles, {} generations, seed {}",
            spec.swarm.num_particles, spec.swarm.max_generations, spec.swarm.seed
        ),
    );
    log(level, LogLevel::Verbose, &format!("  Objective: {}", spec.objective.name));

    let result = run_study(&spec).map_err(|e| format!("Study error: {e}"))?;

    for report in &result.reports {
        log(level, LogLevel::Verbose, &format_generation(report));
    }
    log(level, LogLevel::Normal, &format_result(&spec, &result));
    Ok(())
}
