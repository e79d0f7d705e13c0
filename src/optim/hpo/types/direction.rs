//! Optimization direction

use serde::{Deserialize, Serialize};

/// Whether higher or lower scores are better
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    /// `candidate` strictly improves on `incumbent`
    ///
    /// NaN never improves on anything.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    /// `candidate` strictly improves on an optional incumbent (absent = always improves)
    pub fn improves(self, candidate: f64, incumbent: Option<f64>) -> bool {
        match incumbent {
            Some(best) => self.is_better(candidate, best),
            None => !candidate.is_nan(),
        }
    }

    /// Apply a non-negative complexity penalty so that it always hurts the score
    pub fn penalize(self, score: f64, penalty: f64) -> f64 {
        match self {
            Direction::Maximize => score - penalty,
            Direction::Minimize => score + penalty,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maximize" | "max" => Ok(Self::Maximize),
            "minimize" | "min" => Ok(Self::Minimize),
            _ => Err(format!("Unknown direction: {s}. Use: maximize, minimize")),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maximize => write!(f, "maximize"),
            Self::Minimize => write!(f, "minimize"),
        }
    }
}
