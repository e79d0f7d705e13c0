//! PSO generation loop

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::optim::hpo::encoder::HyperparameterEncoder;
use crate::optim::hpo::error::{HPOError, Result};
use crate::optim::hpo::pruner::{Pruner, PruningHistory};
use crate::optim::hpo::regularizer::Regularizer;
use crate::optim::hpo::swarm::Swarm;
use crate::optim::hpo::types::{
    Direction, HyperparameterSpace, ParameterValue, PruningContext, Trial, TrialState,
};

use super::config::PsoConfig;

/// Error type objectives return
pub type EvaluationError = Box<dyn std::error::Error + Send + Sync>;

/// Black-box function being optimized
///
/// Called concurrently for every particle of a generation, each call with its
/// own [`Trial`]. Long-running objectives should report intermediate values
/// and return early once [`Trial::should_prune`] says so.
pub trait Objective: Send + Sync {
    fn evaluate(&self, trial: &mut Trial) -> std::result::Result<f64, EvaluationError>;
}

impl<F> Objective for F
where
    F: Fn(&mut Trial) -> std::result::Result<f64, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, trial: &mut Trial) -> std::result::Result<f64, EvaluationError> {
        self(trial)
    }
}

/// Global best at the end of some generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSnapshot {
    pub score: f64,
    pub position: Vec<f64>,
    pub params: HashMap<String, ParameterValue>,
    pub particle_id: usize,
    pub generation: usize,
}

/// Synchronized read-only view of the swarm's global best
///
/// Cloned into every trial; only the engine publishes, between generations.
#[derive(Debug, Clone, Default)]
pub struct SharedBest {
    inner: Arc<RwLock<Option<BestSnapshot>>>,
}

impl SharedBest {
    pub fn get(&self) -> Option<BestSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn score(&self) -> Option<f64> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).as_ref().map(|b| b.score)
    }

    pub(crate) fn publish(&self, snapshot: BestSnapshot) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}

/// Everything that happened in one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    /// Archived trials in particle order
    pub trials: Vec<Trial>,
    pub completed: usize,
    pub pruned: usize,
    pub failed: usize,
    /// Global best after this generation
    pub best_score: Option<f64>,
    pub best_params: Option<HashMap<String, ParameterValue>>,
    /// Whether this generation improved the global best
    pub improved: bool,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn count(&self, state: TrialState) -> usize {
        match state {
            TrialState::Completed => self.completed,
            TrialState::Pruned => self.pruned,
            TrialState::Failed => self.failed,
            TrialState::Running => 0,
        }
    }
}

/// Why the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    MaxGenerations,
    Stagnation,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxGenerations => write!(f, "max generations reached"),
            Self::Stagnation => write!(f, "global best stagnated"),
        }
    }
}

/// Outcome of [`PsoEngine::run`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsoResult {
    pub reports: Vec<GenerationReport>,
    pub best: Option<BestSnapshot>,
    pub termination: Termination,
    pub total_failures: usize,
}

impl PsoResult {
    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.score)
    }

    pub fn best_params(&self) -> Option<&HashMap<String, ParameterValue>> {
        self.best.as_ref().map(|b| &b.params)
    }

    /// Trial that produced the global best
    pub fn best_trial(&self) -> Option<&Trial> {
        let best = self.best.as_ref()?;
        self.reports
            .get(best.generation)?
            .trials
            .iter()
            .find(|t| t.particle_id == best.particle_id)
    }

    pub fn generations(&self) -> usize {
        self.reports.len()
    }
}

/// Particle swarm hyperparameter search
///
/// Each generation decodes every particle into a [`Trial`], evaluates all of
/// them on a bounded worker pool, regularizes the scores, then updates
/// personal bests, the global best, and every particle's velocity and
/// position. Generations are hard barriers.
pub struct PsoEngine {
    config: PsoConfig,
    encoder: HyperparameterEncoder,
    objective: Box<dyn Objective>,
    pruner: Option<Arc<dyn Pruner>>,
    regularizer: Option<Box<dyn Regularizer>>,
    swarm: Swarm,
    rng: StdRng,
    pool: rayon::ThreadPool,
    shared_best: SharedBest,
    reports: Vec<GenerationReport>,
    stagnant_generations: usize,
    termination: Option<Termination>,
}

impl std::fmt::Debug for PsoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PsoEngine")
            .field("config", &self.config)
            .field("space", self.encoder.space())
            .field("pruner", &self.pruner)
            .field("regularizer", &self.regularizer)
            .field("generation", &self.swarm.generation())
            .finish_non_exhaustive()
    }
}

impl PsoEngine {
    /// Build an engine and initialize its swarm
    pub fn new(
        space: HyperparameterSpace,
        config: PsoConfig,
        objective: impl Objective + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let encoder = HyperparameterEncoder::new(space)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let swarm = Swarm::initialize_with_rng(
            config.num_particles,
            &encoder.bounds(),
            config.velocity_scale,
            &mut rng,
        )?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .build()
            .map_err(|e| HPOError::InvalidConfig(format!("worker pool: {e}")))?;

        Ok(Self {
            config,
            encoder,
            objective: Box::new(objective),
            pruner: None,
            regularizer: None,
            swarm,
            rng,
            pool,
            shared_best: SharedBest::default(),
            reports: Vec::new(),
            stagnant_generations: 0,
            termination: None,
        })
    }

    /// Enable online pruning
    pub fn with_pruner(self, pruner: impl Pruner + 'static) -> Self {
        self.with_shared_pruner(Arc::new(pruner))
    }

    pub fn with_shared_pruner(mut self, pruner: Arc<dyn Pruner>) -> Self {
        self.pruner = Some(pruner);
        self
    }

    /// Enable complexity regularization
    pub fn with_regularizer(self, regularizer: impl Regularizer + 'static) -> Self {
        self.with_boxed_regularizer(Box::new(regularizer))
    }

    pub fn with_boxed_regularizer(mut self, regularizer: Box<dyn Regularizer>) -> Self {
        self.regularizer = Some(regularizer);
        self
    }

    pub fn config(&self) -> &PsoConfig {
        &self.config
    }

    pub fn space(&self) -> &HyperparameterSpace {
        self.encoder.space()
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn shared_best(&self) -> &SharedBest {
        &self.shared_best
    }

    pub fn reports(&self) -> &[GenerationReport] {
        &self.reports
    }

    pub fn pruner_name(&self) -> Option<&'static str> {
        self.pruner.as_ref().map(|p| p.name())
    }

    pub fn regularizer_name(&self) -> Option<&'static str> {
        self.regularizer.as_ref().map(|r| r.name())
    }

    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }

    /// Run until termination, calling `on_generation` after every generation
    ///
    /// Once the engine has terminated, further calls return the same result
    /// without evaluating anything.
    pub fn run<F>(&mut self, mut on_generation: F) -> Result<PsoResult>
    where
        F: FnMut(&GenerationReport),
    {
        while self.termination.is_none() {
            let report = self.run_generation()?;
            on_generation(&report);
            self.reports.push(report);
        }
        Ok(self.result())
    }

    /// Snapshot of the run so far
    pub fn result(&self) -> PsoResult {
        PsoResult {
            reports: self.reports.clone(),
            best: self.shared_best.get(),
            termination: self.termination.unwrap_or(Termination::MaxGenerations),
            total_failures: self.reports.iter().map(|r| r.failed).sum(),
        }
    }

    fn run_generation(&mut self) -> Result<GenerationReport> {
        let started = Instant::now();
        let generation = self.swarm.generation();
        let direction = self.config.direction;
        log::debug!("generation {generation}: dispatching {} trials", self.swarm.len());

        let mut trials = self.build_trials(generation)?;

        let objective = self.objective.as_ref();
        self.pool.install(|| {
            trials.par_iter_mut().for_each(|trial| evaluate_trial(objective, trial));
        });

        if let Some(regularizer) = &self.regularizer {
            for trial in trials.iter_mut() {
                apply_regularizer(regularizer.as_ref(), trial, direction);
            }
        }

        for trial in &trials {
            let eligible = match trial.state() {
                TrialState::Completed => true,
                TrialState::Pruned => self.config.pruned_update_bests,
                TrialState::Failed | TrialState::Running => false,
            };
            if let (true, Some(score)) = (eligible, trial.score()) {
                self.swarm.offer(trial.particle_id, score, direction);
            }
        }

        let improved = self.swarm.refresh_global_best(direction);
        if improved {
            self.publish_best(generation)?;
        }

        let coefficients = self.config.coefficients();
        self.swarm.step(&coefficients, &mut self.rng);
        self.swarm.advance_generation();

        let count = |state| trials.iter().filter(|t| t.state() == state).count();
        let best = self.shared_best.get();
        let report = GenerationReport {
            generation,
            completed: count(TrialState::Completed),
            pruned: count(TrialState::Pruned),
            failed: count(TrialState::Failed),
            best_score: best.as_ref().map(|b| b.score),
            best_params: best.map(|b| b.params),
            improved,
            duration_ms: started.elapsed().as_millis() as u64,
            trials,
        };

        for trial in report.trials.iter().filter(|t| t.state() == TrialState::Failed) {
            log::warn!(
                "generation {generation}: particle {} failed: {}",
                trial.particle_id,
                trial.error().unwrap_or("unknown error")
            );
        }
        log::info!(
            "generation {}/{}: {} completed, {} pruned, {} failed, best {}",
            generation + 1,
            self.config.max_generations,
            report.completed,
            report.pruned,
            report.failed,
            report.best_score.map_or_else(|| "unset".to_string(), |s| format!("{s:.6}")),
        );

        self.update_termination(improved);
        Ok(report)
    }

    fn build_trials(&self, generation: usize) -> Result<Vec<Trial>> {
        let history = Arc::new(PruningHistory::new(generation));
        self.swarm
            .particles()
            .iter()
            .map(|particle| {
                let params = self.encoder.decode(&particle.position)?;
                let mut trial =
                    Trial::new(particle.id, generation, params, particle.position.clone());
                if let Some(pruner) = &self.pruner {
                    trial.attach_pruning(PruningContext {
                        pruner: Arc::clone(pruner),
                        history: Arc::clone(&history),
                        direction: self.config.direction,
                    });
                }
                trial.attach_shared_best(self.shared_best.clone());
                Ok(trial)
            })
            .collect()
    }

    fn publish_best(&self, generation: usize) -> Result<()> {
        let (Some(score), Some(position), Some(particle_id)) = (
            self.swarm.global_best_score(),
            self.swarm.global_best_position(),
            self.swarm.best_particle(),
        ) else {
            return Ok(());
        };
        let params = self.encoder.decode(position)?;
        log::debug!("generation {generation}: new global best {score:.6} from particle {particle_id}");
        self.shared_best.publish(BestSnapshot {
            score,
            position: position.to_vec(),
            params,
            particle_id,
            generation,
        });
        Ok(())
    }

    fn update_termination(&mut self, improved: bool) {
        if improved {
            self.stagnant_generations = 0;
        } else {
            self.stagnant_generations += 1;
        }

        if self.swarm.generation() >= self.config.max_generations {
            self.termination = Some(Termination::MaxGenerations);
        } else if let Some(patience) = self.config.stagnation_patience {
            if self.stagnant_generations >= patience {
                log::info!("stopping: no improvement in {patience} generations");
                self.termination = Some(Termination::Stagnation);
            }
        }
    }
}

/// Run the objective on one trial and move it to a terminal state
fn evaluate_trial(objective: &dyn Objective, trial: &mut Trial) {
    trial.start();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| objective.evaluate(trial)));
    match outcome {
        Ok(Ok(score)) if trial.is_prune_requested() => trial.prune(score),
        Ok(Ok(score)) if score.is_finite() => trial.complete(score),
        Ok(Ok(score)) => trial.fail(
            HPOError::EvaluationFailure(format!("objective returned non-finite score {score}"))
                .to_string(),
        ),
        Ok(Err(err)) => trial.fail(HPOError::EvaluationFailure(err.to_string()).to_string()),
        Err(payload) => trial.fail(
            HPOError::EvaluationFailure(format!("objective panicked: {}", panic_message(payload.as_ref())))
                .to_string(),
        ),
    }
    log::debug!(
        "generation {} particle {}: {} ({})",
        trial.generation,
        trial.particle_id,
        trial.state(),
        trial.raw_score().map_or_else(|| "-".to_string(), |s| format!("{s:.6}")),
    );
}

fn apply_regularizer(regularizer: &dyn Regularizer, trial: &mut Trial, direction: Direction) {
    let (Some(raw), Some(architecture)) = (trial.raw_score(), trial.architecture().cloned()) else {
        return;
    };
    if trial.state() == TrialState::Failed {
        return;
    }
    match regularizer.regularize(raw, &architecture, direction) {
        Ok(score) => trial.set_score(score),
        Err(err) => trial.fail(HPOError::EvaluationFailure(err.to_string()).to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
