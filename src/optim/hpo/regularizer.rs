//! Complexity-aware score regularization
//!
//! Penalizes a trial's score by the size of the network it evaluated, so that
//! among equally accurate configurations the swarm drifts toward smaller ones.
//!
//! Two variants:
//! - [`WidthRegularizer`]: sum of hidden-layer widths over `max_depth * max_width`
//! - [`StageRegularizer`]: per-stage `width * depth` products of a named
//!   backbone, summed and normalized by a fixed maximum

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};
use crate::optim::hpo::types::{Direction, UserAttr};

/// Network evaluated by a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// Full layer list including input and output sizes
    Layers(Vec<usize>),
    /// Named backbone looked up in a stage table
    Named(String),
}

/// Which [`Architecture`] variant a regularizer understands or an objective attaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureKind {
    Layers,
    Named,
}

impl std::fmt::Display for ArchitectureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Layers => write!(f, "layer lists"),
            Self::Named => write!(f, "named backbones"),
        }
    }
}

impl Architecture {
    pub fn kind(&self) -> ArchitectureKind {
        match self {
            Architecture::Layers(_) => ArchitectureKind::Layers,
            Architecture::Named(_) => ArchitectureKind::Named,
        }
    }

    /// Layer list `[input, hidden..., output]` for a fully connected network
    pub fn mlp(input: usize, hidden: &[usize], output: usize) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 2);
        layers.push(input);
        layers.extend_from_slice(hidden);
        layers.push(output);
        Architecture::Layers(layers)
    }

    /// Named backbone
    pub fn named(name: impl Into<String>) -> Self {
        Architecture::Named(name.into())
    }

    /// Hidden widths (layer list without its first and last entries)
    pub fn hidden_widths(&self) -> &[usize] {
        match self {
            Architecture::Layers(layers) if layers.len() > 2 => &layers[1..layers.len() - 1],
            _ => &[],
        }
    }

    /// Representation stored under the `network` user attribute
    pub fn to_user_attr(&self) -> UserAttr {
        match self {
            Architecture::Layers(layers) => {
                UserAttr::Sequence(layers.iter().map(|&w| UserAttr::from(w)).collect())
            }
            Architecture::Named(name) => UserAttr::Text(name.clone()),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::Layers(layers) => {
                let parts: Vec<String> = layers.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Architecture::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Score penalty proportional to architectural complexity
///
/// Implementations are stateless and deterministic; the engine calls them from
/// the collecting thread after every generation barrier.
pub trait Regularizer: Send + Sync + std::fmt::Debug {
    /// Penalty weight
    fn lambda(&self) -> f64;

    /// Architecture variant this regularizer can score
    fn architecture_kind(&self) -> ArchitectureKind;

    /// Normalized complexity of an architecture (unclamped above 1)
    fn complexity(&self, architecture: &Architecture) -> Result<f64>;

    /// `lambda * complexity`
    fn penalty(&self, architecture: &Architecture) -> Result<f64> {
        Ok(self.lambda() * self.complexity(architecture)?)
    }

    /// Score after applying the penalty in the direction that hurts it
    fn regularize(&self, score: f64, architecture: &Architecture, direction: Direction) -> Result<f64> {
        Ok(direction.penalize(score, self.penalty(architecture)?))
    }

    /// Short name for logs and summaries
    fn name(&self) -> &'static str;
}

/// A zero weight would leave every score unchanged; omit the regularizer instead
fn check_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || lambda <= 0.0 {
        return Err(HPOError::InvalidConfig(format!(
            "regularizer lambda must be finite and > 0, got {lambda}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Width regularizer
// ---------------------------------------------------------------------------

/// Penalizes the total number of hidden neurons of a fully connected network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthRegularizer {
    lambda: f64,
    max_depth: usize,
    max_width: usize,
}

impl WidthRegularizer {
    pub fn new(lambda: f64, max_depth: usize, max_width: usize) -> Result<Self> {
        check_lambda(lambda)?;
        if max_depth == 0 || max_width == 0 {
            return Err(HPOError::InvalidConfig(format!(
                "max_depth and max_width must be >= 1, got {max_depth} and {max_width}"
            )));
        }
        Ok(Self { lambda, max_depth, max_width })
    }

    /// Normalizer: largest total hidden width the search can produce
    pub fn max_total_neurons(&self) -> usize {
        self.max_depth * self.max_width
    }
}

impl Regularizer for WidthRegularizer {
    fn lambda(&self) -> f64 {
        self.lambda
    }

    fn architecture_kind(&self) -> ArchitectureKind {
        ArchitectureKind::Layers
    }

    fn complexity(&self, architecture: &Architecture) -> Result<f64> {
        match architecture {
            Architecture::Layers(_) => {
                let total: usize = architecture.hidden_widths().iter().sum();
                Ok(total as f64 / self.max_total_neurons() as f64)
            }
            Architecture::Named(name) => Err(HPOError::UnknownArchitecture(format!(
                "{name} (width regularizer needs a layer list)"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "WidthRegularizer"
    }
}

// ---------------------------------------------------------------------------
// Stage regularizer
// ---------------------------------------------------------------------------

/// Embedding widths and block depths of a staged backbone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub widths: Vec<usize>,
    pub depths: Vec<usize>,
}

impl StageSpec {
    pub fn new(widths: &[usize], depths: &[usize]) -> Self {
        Self { widths: widths.to_vec(), depths: depths.to_vec() }
    }

    /// Sum of per-stage `width * depth`
    pub fn weighted_width(&self) -> usize {
        self.widths.iter().zip(&self.depths).map(|(w, d)| w * d).sum()
    }
}

/// Default normalizer for [`StageRegularizer`]
pub const DEFAULT_MAX_SUM_WIDTHS: usize = 1024;

/// Mix Transformer backbones and their lightweight variants
pub fn mit_stage_table() -> BTreeMap<String, StageSpec> {
    [
        ("MiT-B0", StageSpec::new(&[32, 64, 160, 256], &[2, 2, 2, 2])),
        ("MiT-LD", StageSpec::new(&[16, 32, 80, 128], &[2, 2, 2, 2])),
        ("MiT-L0", StageSpec::new(&[16, 32, 80, 128], &[1, 1, 1, 1])),
        ("MiT-L1", StageSpec::new(&[8, 16, 40, 64], &[1, 1, 1, 1])),
        ("MiT-L2", StageSpec::new(&[4, 8, 20, 32], &[1, 1, 1, 1])),
    ]
    .into_iter()
    .map(|(name, spec)| (name.to_string(), spec))
    .collect()
}

/// Penalizes named staged backbones by their weighted width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRegularizer {
    lambda: f64,
    max_sum_widths: usize,
    table: BTreeMap<String, StageSpec>,
}

impl StageRegularizer {
    /// Regularizer over the MiT table, normalized by 1024
    pub fn new(lambda: f64) -> Result<Self> {
        Self::with_table(lambda, DEFAULT_MAX_SUM_WIDTHS, mit_stage_table())
    }

    pub fn with_table(
        lambda: f64,
        max_sum_widths: usize,
        table: BTreeMap<String, StageSpec>,
    ) -> Result<Self> {
        check_lambda(lambda)?;
        if max_sum_widths == 0 {
            return Err(HPOError::InvalidConfig("max_sum_widths must be >= 1".to_string()));
        }
        for (name, spec) in &table {
            if spec.widths.len() != spec.depths.len() {
                return Err(HPOError::InvalidConfig(format!(
                    "stage table entry {name}: {} widths but {} depths",
                    spec.widths.len(),
                    spec.depths.len()
                )));
            }
        }
        Ok(Self { lambda, max_sum_widths, table })
    }

    pub fn max_sum_widths(&self) -> usize {
        self.max_sum_widths
    }

    /// Known backbone names, sorted
    pub fn architectures(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

impl Regularizer for StageRegularizer {
    fn lambda(&self) -> f64 {
        self.lambda
    }

    fn architecture_kind(&self) -> ArchitectureKind {
        ArchitectureKind::Named
    }

    fn complexity(&self, architecture: &Architecture) -> Result<f64> {
        match architecture {
            Architecture::Named(name) => {
                let spec = self
                    .table
                    .get(name)
                    .ok_or_else(|| HPOError::UnknownArchitecture(name.clone()))?;
                Ok(spec.weighted_width() as f64 / self.max_sum_widths as f64)
            }
            Architecture::Layers(_) => Err(HPOError::UnknownArchitecture(format!(
                "{architecture} (stage regularizer needs a backbone name)"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "StageRegularizer"
    }
}
