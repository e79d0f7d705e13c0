//! Online pruning of unpromising trials
//!
//! Trials publish intermediate values into a per-generation
//! [`PruningHistory`]; a [`Pruner`] compares the latest report against what
//! the trial's peers reported at the same step.

mod history;
mod median;
#[cfg(test)]
mod tests;

pub use history::{PruningHistory, StepReport};
pub use median::MedianPruner;

use crate::optim::hpo::types::Direction;

/// The report a pruning decision is about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneQuery {
    /// Reporting trial's particle
    pub particle_id: usize,
    /// Generation of the reporting trial
    pub generation: usize,
    /// Step of the report
    pub step: usize,
    /// Reported value
    pub value: f64,
    /// Which way is better
    pub direction: Direction,
}

/// Policy deciding whether a running trial should be abandoned.
///
/// Called concurrently from every worker; implementations must not assume
/// the history holds a complete sample at any step.
pub trait Pruner: Send + Sync + std::fmt::Debug {
    /// Should the trial that made `query` stop now?
    fn should_prune(&self, query: &PruneQuery, history: &PruningHistory) -> bool;

    /// Short name for logs and summaries
    fn name(&self) -> &'static str;
}

/// No-op pruner (never prunes)
#[derive(Debug, Clone, Copy, Default)]
pub struct NopPruner;

impl Pruner for NopPruner {
    fn should_prune(&self, _query: &PruneQuery, _history: &PruningHistory) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "NopPruner"
    }
}
