//! Built-in synthetic objectives
//!
//! Cheap stand-ins for real training runs, used by the CLI and tests.
//!
//! - `sphere`, `rastrigin`: classic test functions over the encoded position
//!   (minimize)
//! - `mlp-surrogate`: a fully connected network whose validation accuracy
//!   follows a synthetic learning curve (maximize)
//! - `backbone-surrogate`: a segmentation model over a named staged backbone
//!   whose mIoU follows a synthetic learning curve (maximize)

use std::collections::BTreeSet;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::optim::hpo::pso::{EvaluationError, Objective};
use crate::optim::hpo::regularizer::{mit_stage_table, Architecture, ArchitectureKind};
use crate::optim::hpo::types::Trial;

/// Sphere function. Global minimum `f(0, ..., 0) = 0`
#[must_use]
pub fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|xi| xi * xi).sum()
}

/// Rastrigin function. Global minimum `f(0, ..., 0) = 0`, many local minima
#[must_use]
pub fn rastrigin(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    10.0 * n + x.iter().map(|xi| xi * xi - 10.0 * (2.0 * PI * xi).cos()).sum::<f64>()
}

/// Synthetic MLP training run
///
/// Reads hidden widths from `hidden_layer_n1_size`, `hidden_layer_n2_size`, ...
/// (layers narrower than `min_width` are dropped) and `learning_rate`. Reports
/// one accuracy per epoch, stops early when the pruner says so, and attaches
/// the layer list so a width regularizer can penalize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpSurrogate {
    pub input_size: usize,
    pub output_size: usize,
    pub max_hidden_layers: usize,
    pub min_width: usize,
    pub max_epochs: usize,
}

impl Default for MlpSurrogate {
    fn default() -> Self {
        Self {
            input_size: 28 * 28,
            output_size: 10,
            max_hidden_layers: 3,
            min_width: 8,
            max_epochs: 30,
        }
    }
}

impl MlpSurrogate {
    /// Layer list for a trial's decoded widths
    pub fn architecture(&self, trial: &Trial) -> Architecture {
        let hidden: Vec<usize> = (1..=self.max_hidden_layers)
            .filter_map(|i| trial.param_int(&format!("hidden_layer_n{i}_size")))
            .filter(|&w| w >= self.min_width as i64)
            .map(|w| w as usize)
            .collect();
        Architecture::mlp(self.input_size, &hidden, self.output_size)
    }

    /// Accuracy reached after `epoch` (0-based) for the given capacity and learning rate
    pub fn accuracy_at(&self, epoch: usize, total_width: usize, learning_rate: f64) -> f64 {
        let capacity = 1.0 - (-(total_width as f64) / 96.0).exp();
        let lr_fit = (-(learning_rate.log10() + 3.0).powi(2) / 2.0).exp();
        let ceiling = 0.1 + 0.88 * capacity * lr_fit;
        let speed = 0.05 + 0.5 * lr_fit;
        0.1 + (ceiling - 0.1) * (1.0 - (-speed * (epoch + 1) as f64).exp())
    }
}

impl Objective for MlpSurrogate {
    fn evaluate(&self, trial: &mut Trial) -> Result<f64, EvaluationError> {
        let architecture = self.architecture(trial);
        let total_width: usize = architecture.hidden_widths().iter().sum();
        let learning_rate = trial.param_f64("learning_rate").unwrap_or(1e-3);
        if learning_rate <= 0.0 {
            return Err(format!("learning_rate must be positive, got {learning_rate}").into());
        }

        let categorical: BTreeSet<String> = trial
            .params
            .values()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if !categorical.is_empty() {
            trial.set_user_attr("categorical", categorical);
        }
        trial.set_architecture(architecture);

        let mut accuracy = 0.0;
        let mut epochs = 0;
        for epoch in 0..self.max_epochs {
            accuracy = self.accuracy_at(epoch, total_width, learning_rate);
            epochs = epoch + 1;
            trial.report_value(epoch, accuracy)?;
            if trial.should_prune() {
                break;
            }
        }
        trial.set_user_attr("epochs", epochs);
        trial.set_user_attr("accuracy", accuracy);
        Ok(accuracy)
    }
}

/// Synthetic segmentation run over a staged backbone
///
/// Reads the backbone name from the `backbone` parameter (falling back to
/// `default_backbone`) and `learning_rate`. Backbones with more weighted width
/// reach a higher mIoU. The backbone name is attached so a stage regularizer
/// can penalize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackboneSurrogate {
    pub default_backbone: String,
    pub max_epochs: usize,
}

impl Default for BackboneSurrogate {
    fn default() -> Self {
        Self { default_backbone: "MiT-B0".to_string(), max_epochs: 20 }
    }
}

impl BackboneSurrogate {
    /// Backbone a trial evaluates
    pub fn backbone(&self, trial: &Trial) -> String {
        trial.param_str("backbone").unwrap_or(self.default_backbone.as_str()).to_string()
    }

    /// mIoU reached after `epoch` (0-based) for the given weighted width and learning rate
    pub fn miou_at(&self, epoch: usize, weighted_width: usize, learning_rate: f64) -> f64 {
        let capacity = 1.0 - (-(weighted_width as f64) / 256.0).exp();
        let lr_fit = (-(learning_rate.log10() + 4.0).powi(2) / 2.0).exp();
        let ceiling = 0.2 + 0.6 * capacity * lr_fit;
        let speed = 0.1 + 0.4 * lr_fit;
        0.05 + (ceiling - 0.05) * (1.0 - (-speed * (epoch + 1) as f64).exp())
    }
}

impl Objective for BackboneSurrogate {
    fn evaluate(&self, trial: &mut Trial) -> Result<f64, EvaluationError> {
        let backbone = self.backbone(trial);
        let Some(stages) = mit_stage_table().remove(&backbone) else {
            return Err(format!("unknown backbone: {backbone}").into());
        };
        let learning_rate = trial.param_f64("learning_rate").unwrap_or(1e-4);
        if learning_rate <= 0.0 {
            return Err(format!("learning_rate must be positive, got {learning_rate}").into());
        }
        trial.set_architecture(Architecture::named(backbone));

        let mut miou = 0.0;
        let mut epochs = 0;
        for epoch in 0..self.max_epochs {
            miou = self.miou_at(epoch, stages.weighted_width(), learning_rate);
            epochs = epoch + 1;
            trial.report_value(epoch, miou)?;
            if trial.should_prune() {
                break;
            }
        }
        trial.set_user_attr("epochs", epochs);
        trial.set_user_attr("miou", miou);
        Ok(miou)
    }
}

/// Objective selectable by name
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinObjective {
    Sphere,
    Rastrigin,
    MlpSurrogate(MlpSurrogate),
    BackboneSurrogate(BackboneSurrogate),
}

impl BuiltinObjective {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Rastrigin => "rastrigin",
            Self::MlpSurrogate(_) => "mlp-surrogate",
            Self::BackboneSurrogate(_) => "backbone-surrogate",
        }
    }

    /// Architecture variant attached to every trial, if any
    pub fn architecture_kind(&self) -> Option<ArchitectureKind> {
        match self {
            Self::Sphere | Self::Rastrigin => None,
            Self::MlpSurrogate(_) => Some(ArchitectureKind::Layers),
            Self::BackboneSurrogate(_) => Some(ArchitectureKind::Named),
        }
    }
}

impl std::str::FromStr for BuiltinObjective {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sphere" => Ok(Self::Sphere),
            "rastrigin" => Ok(Self::Rastrigin),
            "mlp-surrogate" | "mlp_surrogate" | "mlp" => {
                Ok(Self::MlpSurrogate(MlpSurrogate::default()))
            }
            "backbone-surrogate" | "backbone_surrogate" | "backbone" => {
                Ok(Self::BackboneSurrogate(BackboneSurrogate::default()))
            }
            _ => Err(format!(
                "Unknown objective: {s}. Use: sphere, rastrigin, mlp-surrogate, backbone-surrogate"
            )),
        }
    }
}

impl std::fmt::Display for BuiltinObjective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Objective for BuiltinObjective {
    fn evaluate(&self, trial: &mut Trial) -> Result<f64, EvaluationError> {
        match self {
            Self::Sphere => Ok(sphere(&trial.position)),
            Self::Rastrigin => Ok(rastrigin(&trial.position)),
            Self::MlpSurrogate(surrogate) => surrogate.evaluate(trial),
            Self::BackboneSurrogate(surrogate) => surrogate.evaluate(trial),
        }
    }
}
