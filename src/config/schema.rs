//! YAML schema definitions for declarative study configuration

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::optim::hpo::{
    ArchitectureKind, BackboneSurrogate, BuiltinObjective, HPOError, HyperparameterSpace,
    MedianPruner, MlpSurrogate, ParameterDomain, PsoConfig, Regularizer, StageRegularizer,
    WidthRegularizer,
};
use crate::optim::hpo::regularizer::{mit_stage_table, DEFAULT_MAX_SUM_WIDTHS};

use super::validate::ValidationError;

/// Complete study specification
///
/// ```yaml
/// name: mnist_pso
/// space:
///   - name: learning_rate
///     type: continuous
///     low: 0.0001
///     high: 0.1
///   - name: optimizer
///     type: categorical
///     choices: [adam, sgd, rmsprop]
/// swarm:
///   num_particles: 10
///   max_generations: 20
/// pruner: {}
/// regularizer:
///   type: width
///   lambda: 0.05
///   max_depth: 3
///   max_width: 256
/// objective:
///   name: mlp-surrogate
/// output:
///   csv_dir: results/csv
///   txt_dir: results/txt
///   metric_to_follow: accuracy
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySpec {
    /// Study name, used for output file names
    pub name: String,

    /// Parameters in coordinate order
    pub space: Vec<ParamSpec>,

    /// Swarm settings
    #[serde(default)]
    pub swarm: PsoConfig,

    /// Median pruner (disabled when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruner: Option<PrunerSpec>,

    /// Complexity regularizer (disabled when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regularizer: Option<RegularizerSpec>,

    /// Built-in objective to optimize
    pub objective: ObjectiveSpec,

    /// Where records, summaries and the session log go
    #[serde(default)]
    pub output: OutputSpec,
}

impl StudySpec {
    /// Search space in declaration order
    pub fn build_space(&self) -> Result<HyperparameterSpace, HPOError> {
        let mut space = HyperparameterSpace::new();
        for param in &self.space {
            let domain = param
                .to_domain()
                .map_err(|e| HPOError::InvalidSpec(param.name.clone(), e.to_string()))?;
            space.add(&param.name, domain)?;
        }
        space.validate()?;
        Ok(space)
    }

    /// Parameter names that appear more than once
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.space
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| !seen.insert(*name))
            .collect()
    }
}

/// Kind of a search-space parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Continuous,
    Categorical,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Continuous => write!(f, "continuous"),
            ParamType::Categorical => write!(f, "categorical"),
        }
    }
}

/// One parameter of the search space
///
/// Continuous parameters need `low` and `high`. Categorical parameters need
/// `choices`; their numeric range defaults to `[0, len(choices)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ParamType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl ParamSpec {
    pub fn continuous(name: &str, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamType::Continuous,
            low: Some(low),
            high: Some(high),
            choices: Vec::new(),
        }
    }

    pub fn categorical(name: &str, choices: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamType::Categorical,
            low: None,
            high: None,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Numeric range of the encoded coordinate
    pub fn bounds(&self) -> Result<(f64, f64), ValidationError> {
        match (self.kind, self.low, self.high) {
            (_, Some(low), Some(high)) => Ok((low, high)),
            (ParamType::Categorical, None, None) => Ok((0.0, self.choices.len() as f64)),
            _ => Err(ValidationError::MissingBounds(self.name.clone())),
        }
    }

    /// Check this parameter in isolation
    pub fn check(&self) -> Result<(), ValidationError> {
        match self.kind {
            ParamType::Continuous if !self.choices.is_empty() => {
                return Err(ValidationError::UnexpectedChoices(self.name.clone()));
            }
            ParamType::Categorical if self.choices.is_empty() => {
                return Err(ValidationError::EmptyChoices(self.name.clone()));
            }
            _ => {}
        }
        let (low, high) = self.bounds()?;
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ValidationError::InvalidBounds { name: self.name.clone(), low, high });
        }
        Ok(())
    }

    pub fn to_domain(&self) -> Result<ParameterDomain, ValidationError> {
        self.check()?;
        let (low, high) = self.bounds()?;
        Ok(match self.kind {
            ParamType::Continuous => ParameterDomain::continuous(low, high),
            ParamType::Categorical => {
                ParameterDomain::categorical_in(self.choices.as_slice(), low, high)
            }
        })
    }
}

/// Median pruner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrunerSpec {
    pub n_startup_generations: usize,
    pub n_warmup_steps: usize,
    pub interval_steps: usize,
    pub min_trials_per_step: usize,
    pub exempt_best: bool,
}

impl Default for PrunerSpec {
    fn default() -> Self {
        let pruner = MedianPruner::default();
        Self {
            n_startup_generations: pruner.n_startup_generations(),
            n_warmup_steps: pruner.n_warmup_steps(),
            interval_steps: pruner.interval_steps(),
            min_trials_per_step: pruner.min_trials_per_step(),
            exempt_best: pruner.exempt_best(),
        }
    }
}

impl PrunerSpec {
    pub fn build(&self) -> Result<MedianPruner, HPOError> {
        Ok(MedianPruner::new(
            self.n_startup_generations,
            self.n_warmup_steps,
            self.interval_steps,
            self.min_trials_per_step,
        )?
        .with_best_exemption(self.exempt_best))
    }
}

fn default_max_sum_widths() -> usize {
    DEFAULT_MAX_SUM_WIDTHS
}

/// Complexity regularizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegularizerSpec {
    /// Total hidden neurons of a layer list
    Width {
        lambda: f64,
        max_depth: usize,
        max_width: usize,
    },
    /// Weighted stage widths of a named backbone
    Stage {
        lambda: f64,
        #[serde(default = "default_max_sum_widths")]
        max_sum_widths: usize,
    },
}

impl RegularizerSpec {
    pub fn lambda(&self) -> f64 {
        match self {
            RegularizerSpec::Width { lambda, .. } | RegularizerSpec::Stage { lambda, .. } => {
                *lambda
            }
        }
    }

    /// Architecture variant the regularizer can score
    pub fn architecture_kind(&self) -> ArchitectureKind {
        match self {
            RegularizerSpec::Width { .. } => ArchitectureKind::Layers,
            RegularizerSpec::Stage { .. } => ArchitectureKind::Named,
        }
    }

    pub fn build(&self) -> Result<Box<dyn Regularizer>, HPOError> {
        Ok(match *self {
            RegularizerSpec::Width { lambda, max_depth, max_width } => {
                Box::new(WidthRegularizer::new(lambda, max_depth, max_width)?)
            }
            RegularizerSpec::Stage { lambda, max_sum_widths } => Box::new(
                StageRegularizer::with_table(lambda, max_sum_widths, mit_stage_table())?,
            ),
        })
    }
}

/// Objective selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// `sphere`, `rastrigin`, `mlp-surrogate` or `backbone-surrogate`
    pub name: String,

    /// Surrogate shape, used by `mlp-surrogate` only
    #[serde(default)]
    pub surrogate: MlpSurrogate,

    /// Backbone run settings, used by `backbone-surrogate` only
    #[serde(default)]
    pub backbone: BackboneSurrogate,
}

impl ObjectiveSpec {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            surrogate: MlpSurrogate::default(),
            backbone: BackboneSurrogate::default(),
        }
    }

    pub fn build(&self) -> Result<BuiltinObjective, ValidationError> {
        let objective: BuiltinObjective = self
            .name
            .parse()
            .map_err(|_| ValidationError::UnknownObjective(self.name.clone()))?;
        Ok(match objective {
            BuiltinObjective::MlpSurrogate(_) => {
                BuiltinObjective::MlpSurrogate(self.surrogate.clone())
            }
            BuiltinObjective::BackboneSurrogate(_) => {
                BuiltinObjective::BackboneSurrogate(self.backbone.clone())
            }
            other => other,
        })
    }
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    /// Directory of `{study}_{session}.csv`
    pub csv_dir: PathBuf,
    /// Directory of `{study}_{session}.txt`
    pub txt_dir: PathBuf,
    pub session: u32,
    /// User attribute of the best trial to report in the summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_to_follow: Option<String>,
    /// Session log file (no log when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("results/csv"),
            txt_dir: PathBuf::from("results/txt"),
            session: 1,
            metric_to_follow: None,
            log_file: None,
        }
    }
}

impl OutputSpec {
    /// Move every output under `dir`
    pub fn relocate(&mut self, dir: &std::path::Path) {
        self.csv_dir = dir.join("csv");
        self.txt_dir = dir.join("txt");
        if let Some(log_file) = &self.log_file {
            let file_name = log_file.file_name().map_or_else(
                || std::ffi::OsString::from("session.log"),
                std::ffi::OsStr::to_os_string,
            );
            self.log_file = Some(dir.join("log").join(file_name));
        }
    }
}
