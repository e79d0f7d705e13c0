//! Parameter value and domain types

use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};

/// Parameter value (decoded from a particle coordinate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Categorical(String),
}

impl ParameterValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Categorical(_) => None,
        }
    }

    /// Get as int, rounding half away from zero
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Float(v) => Some(v.round() as i64),
            ParameterValue::Categorical(_) => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Categorical(s) => Some(s),
            ParameterValue::Float(_) => None,
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Categorical(s) => write!(f, "{s}"),
        }
    }
}

/// Parameter domain (one coordinate of the search space)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterDomain {
    /// Continuous range [low, high]
    Continuous { low: f64, high: f64 },
    /// Ordered labels spread as equal-width bins over [low, high]
    Categorical {
        choices: Vec<String>,
        low: f64,
        high: f64,
    },
}

impl ParameterDomain {
    /// Continuous domain over [low, high]
    pub fn continuous(low: f64, high: f64) -> Self {
        ParameterDomain::Continuous { low, high }
    }

    /// Categorical domain over the default numeric range [0, N]
    pub fn categorical<S: AsRef<str>>(choices: &[S]) -> Self {
        let n = choices.len() as f64;
        Self::categorical_in(choices, 0.0, n)
    }

    /// Categorical domain over an explicit numeric range
    pub fn categorical_in<S: AsRef<str>>(choices: &[S], low: f64, high: f64) -> Self {
        ParameterDomain::Categorical {
            choices: choices.iter().map(|c| c.as_ref().to_string()).collect(),
            low,
            high,
        }
    }

    /// Numeric bounds of the encoded coordinate
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            ParameterDomain::Continuous { low, high }
            | ParameterDomain::Categorical { low, high, .. } => (*low, *high),
        }
    }

    /// Width of the encoded coordinate range
    pub fn span(&self) -> f64 {
        let (low, high) = self.bounds();
        high - low
    }

    /// Check the domain invariants, naming the offending parameter on failure
    pub fn validate(&self, name: &str) -> Result<()> {
        let (low, high) = self.bounds();
        if !low.is_finite() || !high.is_finite() {
            return Err(HPOError::InvalidSpec(
                name.to_string(),
                format!("bounds must be finite, got [{low}, {high}]"),
            ));
        }
        if low >= high {
            return Err(HPOError::InvalidSpec(
                name.to_string(),
                format!("low ({low}) must be < high ({high})"),
            ));
        }
        if let ParameterDomain::Categorical { choices, .. } = self {
            if choices.is_empty() {
                return Err(HPOError::InvalidSpec(
                    name.to_string(),
                    "categorical label list is empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Check if a decoded value is valid for this domain
    pub fn is_valid(&self, value: &ParameterValue) -> bool {
        match (self, value) {
            (ParameterDomain::Continuous { low, high }, ParameterValue::Float(v)) => {
                *v >= *low && *v <= *high
            }
            (ParameterDomain::Categorical { choices, .. }, ParameterValue::Categorical(s)) => {
                choices.contains(s)
            }
            _ => false,
        }
    }

    /// Short label for display
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterDomain::Continuous { .. } => "continuous",
            ParameterDomain::Categorical { .. } => "categorical",
        }
    }
}
