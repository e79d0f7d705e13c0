//! Per-generation record of intermediate values

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// One intermediate value reported at a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub particle_id: usize,
    pub value: f64,
}

type Bucket = Arc<Mutex<Vec<StepReport>>>;

/// Intermediate values reported by the trials of one generation, keyed by step
///
/// Shared by every running trial of the generation. Each step owns its own
/// bucket lock, so appends and reads at one step never block another step.
/// Readers get a snapshot: a step's sample may still be filling up.
#[derive(Debug, Default)]
pub struct PruningHistory {
    generation: usize,
    steps: RwLock<BTreeMap<usize, Bucket>>,
}

impl PruningHistory {
    /// Create an empty history for a generation
    pub fn new(generation: usize) -> Self {
        Self { generation, steps: RwLock::new(BTreeMap::new()) }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    fn bucket(&self, step: usize) -> Option<Bucket> {
        self.steps.read().unwrap_or_else(PoisonError::into_inner).get(&step).cloned()
    }

    fn bucket_or_insert(&self, step: usize) -> Bucket {
        if let Some(bucket) = self.bucket(step) {
            return bucket;
        }
        let mut steps = self.steps.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(steps.entry(step).or_default())
    }

    /// Append a value reported by `particle_id` at `step`
    pub fn record(&self, step: usize, particle_id: usize, value: f64) {
        let bucket = self.bucket_or_insert(step);
        bucket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StepReport { particle_id, value });
    }

    /// Snapshot of every report at `step`
    pub fn reports_at(&self, step: usize) -> Vec<StepReport> {
        self.bucket(step)
            .map(|b| b.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Values reported at `step` by trials other than `particle_id`
    pub fn others_at(&self, step: usize, particle_id: usize) -> Vec<f64> {
        self.reports_at(step)
            .into_iter()
            .filter(|r| r.particle_id != particle_id)
            .map(|r| r.value)
            .collect()
    }

    /// Number of reports at `step`
    pub fn count_at(&self, step: usize) -> usize {
        self.bucket(step)
            .map_or(0, |b| b.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Steps that have at least one report, ascending
    pub fn steps(&self) -> Vec<usize> {
        self.steps.read().unwrap_or_else(PoisonError::into_inner).keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}
