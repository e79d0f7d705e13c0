//! Search-space encoding
//!
//! Maps named hyperparameters to the fixed-length numeric vectors particles
//! move through, and back. Continuous parameters pass through (clamped);
//! categorical parameters occupy `N` equal-width bins over their numeric range
//! and encode to the bin midpoint.

use std::collections::HashMap;

use crate::optim::hpo::error::{HPOError, Result};
use crate::optim::hpo::types::{HyperparameterSpace, ParameterDomain, ParameterValue};

/// Coordinates this close to a bin edge (in bin widths) snap onto it
const EDGE_EPS: f64 = 1e-9;

/// Index of the categorical bin holding `x`
///
/// `x` is clamped into `[low, high]`. A coordinate sitting on an interior edge
/// belongs to the upper bin; `high` belongs to the last bin.
pub fn bin_index(x: f64, low: f64, high: f64, n_bins: usize) -> usize {
    if n_bins <= 1 {
        return 0;
    }
    let x = if x.is_nan() { low } else { x.clamp(low, high) };
    let width = (high - low) / n_bins as f64;
    let t = (x - low) / width;
    let nearest = t.round();
    let t = if (t - nearest).abs() < EDGE_EPS { nearest } else { t };
    (t.floor() as usize).min(n_bins - 1)
}

/// Midpoint coordinate of categorical bin `index`
pub fn bin_midpoint(index: usize, low: f64, high: f64, n_bins: usize) -> f64 {
    let width = (high - low) / n_bins.max(1) as f64;
    low + (index as f64 + 0.5) * width
}

/// Decode one coordinate against its domain
pub fn decode_coordinate(domain: &ParameterDomain, x: f64) -> ParameterValue {
    match domain {
        ParameterDomain::Continuous { low, high } => {
            let x = if x.is_nan() { *low } else { x.clamp(*low, *high) };
            ParameterValue::Float(x)
        }
        ParameterDomain::Categorical { choices, low, high } => {
            let idx = bin_index(x, *low, *high, choices.len());
            ParameterValue::Categorical(choices[idx].clone())
        }
    }
}

/// Encode one decoded value against its domain
pub fn encode_value(name: &str, domain: &ParameterDomain, value: &ParameterValue) -> Result<f64> {
    match (domain, value) {
        (ParameterDomain::Continuous { .. }, ParameterValue::Float(v)) => Ok(*v),
        (ParameterDomain::Categorical { choices, low, high }, ParameterValue::Categorical(label)) => {
            let idx = choices
                .iter()
                .position(|c| c == label)
                .ok_or_else(|| HPOError::InvalidValue(name.to_string(), label.clone()))?;
            Ok(bin_midpoint(idx, *low, *high, choices.len()))
        }
        _ => Err(HPOError::InvalidValue(name.to_string(), format!("{value:?}"))),
    }
}

/// Bidirectional mapping between a search space and encoded vectors
#[derive(Debug, Clone)]
pub struct HyperparameterEncoder {
    space: HyperparameterSpace,
}

impl HyperparameterEncoder {
    /// Create an encoder, rejecting empty or malformed spaces
    pub fn new(space: HyperparameterSpace) -> Result<Self> {
        space.validate()?;
        Ok(Self { space })
    }

    pub fn space(&self) -> &HyperparameterSpace {
        &self.space
    }

    /// Encoded dimension
    pub fn dim(&self) -> usize {
        self.space.len()
    }

    /// Per-coordinate bounds in declaration order
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.space.iter().map(|s| s.domain.bounds()).collect()
    }

    /// Decode a position into named hyperparameters
    pub fn decode(&self, vector: &[f64]) -> Result<HashMap<String, ParameterValue>> {
        self.check_dim(vector.len())?;
        Ok(self
            .space
            .iter()
            .zip(vector)
            .map(|(spec, &x)| (spec.name.clone(), decode_coordinate(&spec.domain, x)))
            .collect())
    }

    /// Encode named hyperparameters into a position
    pub fn encode(&self, params: &HashMap<String, ParameterValue>) -> Result<Vec<f64>> {
        self.space
            .iter()
            .map(|spec| {
                let value = params
                    .get(&spec.name)
                    .ok_or_else(|| HPOError::ParameterNotFound(spec.name.clone()))?;
                encode_value(&spec.name, &spec.domain, value)
            })
            .collect()
    }

    fn check_dim(&self, got: usize) -> Result<()> {
        if got != self.dim() {
            return Err(HPOError::DimensionMismatch { expected: self.dim(), got });
        }
        Ok(())
    }
}
