//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_spec, ParamType, RegularizerSpec, StudySpec, ValidateArgs};

/// Format the search space as a string
pub fn format_space_info(spec: &StudySpec) -> String {
    let mut lines = vec![format!("  Parameters: {}", spec.space.len())];
    for param in &spec.space {
        let (low, high) = param.bounds().unwrap_or((f64::NAN, f64::NAN));
        let line = match param.kind {
            ParamType::Continuous => format!("    {}: continuous [{low}, {high}]", param.name),
            ParamType::Categorical => format!(
                "    {}: categorical {{{}}} over [{low}, {high}]",
                param.name,
                param.choices.join(", ")
            ),
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// Format swarm configuration as a string
pub fn format_swarm_info(spec: &StudySpec) -> String {
    let swarm = &spec.swarm;
    let mut lines = vec![
        format!("  Particles: {}", swarm.num_particles),
        format!("  Generations: {}", swarm.max_generations),
        format!(
            "  Coefficients: w={} c1={} c2={}",
            swarm.inertia, swarm.cognitive, swarm.social
        ),
        format!("  Direction: {}", swarm.direction),
        format!("  Seed: {}", swarm.seed),
    ];
    if let Some(workers) = swarm.workers {
        lines.push(format!("  Workers: {workers}"));
    }
    if let Some(patience) = swarm.stagnation_patience {
        lines.push(format!("  Stagnation patience: {patience}"));
    }
    lines.join("\n")
}

/// Format pruner configuration as a string
pub fn format_pruner_info(spec: &StudySpec) -> Option<String> {
    spec.pruner.as_ref().map(|pruner| {
        format!(
            "  Median pruner:\n    Startup generations: {}\n    Warmup steps: {}\n    Interval: {}\n    Min trials per step: {}\n    Exempt best: {}",
            pruner.n_startup_generations,
            pruner.n_warmup_steps,
            pruner.interval_steps,
            pruner.min_trials_per_step,
            pruner.exempt_best
        )
    })
}

/// Format regularizer configuration as a string
pub fn format_regularizer_info(spec: &StudySpec) -> Option<String> {
    spec.regularizer.as_ref().map(|regularizer| match regularizer {
        RegularizerSpec::Width { lambda, max_depth, max_width } => format!(
            "  Width regularizer:\n    Lambda: {lambda}\n    Max depth: {max_depth}\n    Max width: {max_width}"
        ),
        RegularizerSpec::Stage { lambda, max_sum_widths } => format!(
            "  Stage regularizer:\n    Lambda: {lambda}\n    Max sum of widths: {max_sum_widths}"
        ),
    })
}

/// Print detailed study summary
pub fn print_detailed_summary(spec: &StudySpec) {
    println!();
    println!("Study Summary:");
    println!("  Name: {}", spec.name);
    println!("  Objective: {}", spec.objective.name);
    println!();
    println!("{}", format_space_info(spec));
    println!();
    println!("{}", format_swarm_info(spec));

    if let Some(pruner_info) = format_pruner_info(spec) {
        println!();
        println!("{pruner_info}");
    }

    if let Some(regularizer_info) = format_regularizer_info(spec) {
        println!();
        println!("{regularizer_info}");
    }
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating study: {}", args.config.display()),
    );

    let spec = load_spec(&args.config).map_err(|e| format!("Validation failed: {e}"))?;

    log(level, LogLevel::Normal, "Study is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&spec);
    }

    Ok(())
}
