//! Generation-aware median pruner

use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};

use super::history::PruningHistory;
use super::{PruneQuery, Pruner};

/// Median of a non-empty sample (mean of the two middle values for even sizes)
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Prunes a trial whose intermediate value is worse than the median of its
/// peers at the same step of the same generation.
///
/// A report is eligible only once the swarm is past its startup generations,
/// the step is past warmup and on the check interval, and at least
/// `min_trials_per_step` other trials have reported at that step. With
/// `exempt_best` (the default) the best value at a step is never pruned, so
/// every step keeps at least one survivor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianPruner {
    pub(crate) n_startup_generations: usize,
    pub(crate) n_warmup_steps: usize,
    pub(crate) interval_steps: usize,
    pub(crate) min_trials_per_step: usize,
    pub(crate) exempt_best: bool,
}

impl Default for MedianPruner {
    fn default() -> Self {
        Self {
            n_startup_generations: 3,
            n_warmup_steps: 4,
            interval_steps: 4,
            min_trials_per_step: 4,
            exempt_best: true,
        }
    }
}

impl MedianPruner {
    /// Create a median pruner, rejecting thresholds that could never be met
    pub fn new(
        n_startup_generations: usize,
        n_warmup_steps: usize,
        interval_steps: usize,
        min_trials_per_step: usize,
    ) -> Result<Self> {
        let pruner = Self {
            n_startup_generations,
            n_warmup_steps,
            interval_steps,
            min_trials_per_step,
            exempt_best: true,
        };
        pruner.validate()?;
        Ok(pruner)
    }

    /// Enable or disable the per-step best exemption
    pub fn with_best_exemption(mut self, exempt_best: bool) -> Self {
        self.exempt_best = exempt_best;
        self
    }

    /// Check thresholds (for pruners built through deserialization)
    pub fn validate(&self) -> Result<()> {
        if self.interval_steps < 1 {
            return Err(HPOError::PruningPolicyViolation(
                "interval_steps must be >= 1".to_string(),
            ));
        }
        if self.min_trials_per_step < 1 {
            return Err(HPOError::PruningPolicyViolation(
                "min_trials_per_step must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn n_startup_generations(&self) -> usize {
        self.n_startup_generations
    }

    pub fn n_warmup_steps(&self) -> usize {
        self.n_warmup_steps
    }

    pub fn interval_steps(&self) -> usize {
        self.interval_steps
    }

    pub fn min_trials_per_step(&self) -> usize {
        self.min_trials_per_step
    }

    pub fn exempt_best(&self) -> bool {
        self.exempt_best
    }

    /// Whether `(generation, step)` is a checkpoint at all
    fn is_checkpoint(&self, generation: usize, step: usize) -> bool {
        generation >= self.n_startup_generations
            && step >= self.n_warmup_steps
            && (step - self.n_warmup_steps) % self.interval_steps.max(1) == 0
    }
}

impl Pruner for MedianPruner {
    fn should_prune(&self, query: &PruneQuery, history: &PruningHistory) -> bool {
        if !self.is_checkpoint(query.generation, query.step) {
            return false;
        }

        let others = history.others_at(query.step, query.particle_id);
        if others.len() < self.min_trials_per_step.max(1) {
            return false;
        }

        if query.value.is_nan() {
            return true;
        }

        if self.exempt_best && !others.iter().any(|&o| query.direction.is_better(o, query.value)) {
            return false;
        }

        match median(&others) {
            Some(m) => query.direction.is_better(m, query.value),
            None => false,
        }
    }

    fn name(&self) -> &'static str {
        "MedianPruner"
    }
}
