//! Trial types for HPO

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};
use crate::optim::hpo::pruner::{PruneQuery, Pruner, PruningHistory};
use crate::optim::hpo::pso::SharedBest;
use crate::optim::hpo::regularizer::Architecture;

use super::direction::Direction;
use super::parameter::ParameterValue;

/// User attribute key under which [`Trial::set_architecture`] stores the layer list
pub const NETWORK_ATTR: &str = "network";

/// Trial state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialState {
    Running,
    Completed,
    Pruned,
    Failed,
}

impl TrialState {
    /// Terminal states never go back to `Running`
    pub fn is_terminal(self) -> bool {
        !matches!(self, TrialState::Running)
    }
}

impl std::fmt::Display for TrialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETE"),
            Self::Pruned => write!(f, "PRUNED"),
            Self::Failed => write!(f, "FAIL"),
        }
    }
}

/// Free-form trial metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserAttr {
    Number(f64),
    Text(String),
    Sequence(Vec<UserAttr>),
    Set(BTreeSet<String>),
}

impl UserAttr {
    /// Get as number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            UserAttr::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserAttr::Number(v) => write!(f, "{v}"),
            UserAttr::Text(s) => write!(f, "{s}"),
            UserAttr::Sequence(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            UserAttr::Set(items) => {
                let parts: Vec<&str> = items.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<f64> for UserAttr {
    fn from(v: f64) -> Self {
        UserAttr::Number(v)
    }
}

impl From<usize> for UserAttr {
    fn from(v: usize) -> Self {
        UserAttr::Number(v as f64)
    }
}

impl From<i32> for UserAttr {
    fn from(v: i32) -> Self {
        UserAttr::Number(f64::from(v))
    }
}

impl From<i64> for UserAttr {
    fn from(v: i64) -> Self {
        UserAttr::Number(v as f64)
    }
}

impl From<&str> for UserAttr {
    fn from(v: &str) -> Self {
        UserAttr::Text(v.to_string())
    }
}

impl From<String> for UserAttr {
    fn from(v: String) -> Self {
        UserAttr::Text(v)
    }
}

impl<T: Into<UserAttr>> From<Vec<T>> for UserAttr {
    fn from(v: Vec<T>) -> Self {
        UserAttr::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeSet<String>> for UserAttr {
    fn from(v: BTreeSet<String>) -> Self {
        UserAttr::Set(v)
    }
}

/// Pruning wiring attached by the engine for the duration of one generation
#[derive(Debug, Clone)]
pub(crate) struct PruningContext {
    pub(crate) pruner: Arc<dyn Pruner>,
    pub(crate) history: Arc<PruningHistory>,
    pub(crate) direction: Direction,
}

/// Evaluation context for one particle in one generation
///
/// The engine creates a fresh trial per particle per generation and hands it to
/// the objective, which reports intermediate values and polls
/// [`Trial::should_prune`] after each report. Once terminal the trial is
/// archived in the generation report and never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    /// Particle that produced this configuration
    pub particle_id: usize,
    /// Generation the trial belongs to
    pub generation: usize,
    /// Decoded hyperparameters
    pub params: HashMap<String, ParameterValue>,
    /// Encoded position the parameters were decoded from
    pub position: Vec<f64>,
    reports: Vec<(usize, f64)>,
    state: TrialState,
    user_attrs: BTreeMap<String, UserAttr>,
    architecture: Option<Architecture>,
    raw_score: Option<f64>,
    score: Option<f64>,
    error: Option<String>,
    datetime_start: DateTime<Utc>,
    datetime_complete: Option<DateTime<Utc>>,
    duration_ms: Option<u64>,
    prune_requested: bool,
    #[serde(skip)]
    started_at: Option<Instant>,
    #[serde(skip)]
    pruning: Option<PruningContext>,
    #[serde(skip)]
    shared_best: Option<SharedBest>,
}

impl Trial {
    /// Create a running trial
    pub fn new(
        particle_id: usize,
        generation: usize,
        params: HashMap<String, ParameterValue>,
        position: Vec<f64>,
    ) -> Self {
        Self {
            particle_id,
            generation,
            params,
            position,
            reports: Vec::new(),
            state: TrialState::Running,
            user_attrs: BTreeMap::new(),
            architecture: None,
            raw_score: None,
            score: None,
            error: None,
            datetime_start: Utc::now(),
            datetime_complete: None,
            duration_ms: None,
            prune_requested: false,
            started_at: Some(Instant::now()),
            pruning: None,
            shared_best: None,
        }
    }

    pub(crate) fn attach_pruning(&mut self, context: PruningContext) {
        self.pruning = Some(context);
    }

    pub(crate) fn attach_shared_best(&mut self, best: SharedBest) {
        self.shared_best = Some(best);
    }

    // -------------------------------------------------------------------------
    // Objective-facing API
    // -------------------------------------------------------------------------

    /// Record an intermediate value (e.g. validation accuracy after an epoch)
    ///
    /// Steps must be strictly increasing. When pruning is enabled the value is
    /// also published to the generation's shared history.
    pub fn report_value(&mut self, step: usize, value: f64) -> Result<()> {
        if let Some(&(last, _)) = self.reports.last() {
            if step <= last {
                return Err(HPOError::OutOfOrderReport { step, last });
            }
        }
        self.reports.push((step, value));
        if let Some(ctx) = &self.pruning {
            ctx.history.record(step, self.particle_id, value);
        }
        Ok(())
    }

    /// Ask an explicit pruner about the latest report
    ///
    /// Pure query: neither the report log nor the trial state changes.
    pub fn should_prune_with(
        &self,
        pruner: &dyn Pruner,
        history: &PruningHistory,
        direction: Direction,
    ) -> bool {
        match self.reports.last() {
            Some(&(step, value)) => {
                let query = PruneQuery {
                    particle_id: self.particle_id,
                    generation: self.generation,
                    step,
                    value,
                    direction,
                };
                pruner.should_prune(&query, history)
            }
            None => false,
        }
    }

    /// Ask the engine's pruner about the latest report
    ///
    /// Returns false when pruning is disabled. A positive answer is remembered
    /// as a cancellation request; the objective should stop and return.
    pub fn should_prune(&mut self) -> bool {
        let decision = match &self.pruning {
            Some(ctx) => self.should_prune_with(ctx.pruner.as_ref(), &ctx.history, ctx.direction),
            None => false,
        };
        if decision {
            self.prune_requested = true;
        }
        decision
    }

    /// Whether a pruner has asked this trial to stop
    pub fn is_prune_requested(&self) -> bool {
        self.prune_requested
    }

    /// Store a metadata value, overwriting any previous value for `key`
    pub fn set_user_attr(&mut self, key: &str, value: impl Into<UserAttr>) {
        self.user_attrs.insert(key.to_string(), value.into());
    }

    /// Attach the evaluated architecture used for complexity regularization
    pub fn set_architecture(&mut self, architecture: Architecture) {
        self.set_user_attr(NETWORK_ATTR, architecture.to_user_attr());
        self.architecture = Some(architecture);
    }

    /// Best global score seen by the swarm before this generation
    pub fn swarm_best(&self) -> Option<f64> {
        self.shared_best.as_ref().and_then(SharedBest::score)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Get a decoded parameter
    pub fn param(&self, name: &str) -> Option<&ParameterValue> {
        self.params.get(name)
    }

    /// Get a continuous parameter
    pub fn param_f64(&self, name: &str) -> Option<f64> {
        self.param(name).and_then(ParameterValue::as_float)
    }

    /// Get a continuous parameter rounded to an integer
    pub fn param_int(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(ParameterValue::as_int)
    }

    /// Get a categorical parameter
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ParameterValue::as_str)
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn reports(&self) -> &[(usize, f64)] {
        &self.reports
    }

    /// Latest `(step, value)` report
    pub fn last_report(&self) -> Option<(usize, f64)> {
        self.reports.last().copied()
    }

    pub fn user_attrs(&self) -> &BTreeMap<String, UserAttr> {
        &self.user_attrs
    }

    pub fn user_attr(&self, key: &str) -> Option<&UserAttr> {
        self.user_attrs.get(key)
    }

    pub fn architecture(&self) -> Option<&Architecture> {
        self.architecture.as_ref()
    }

    /// Score as returned by the objective (or last report when pruned)
    pub fn raw_score(&self) -> Option<f64> {
        self.raw_score
    }

    /// Regularized score used for best tracking; absent for failed trials
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Failure message for failed trials
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn datetime_start(&self) -> DateTime<Utc> {
        self.datetime_start
    }

    pub fn datetime_complete(&self) -> Option<DateTime<Utc>> {
        self.datetime_complete
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    // -------------------------------------------------------------------------
    // Engine-side transitions
    // -------------------------------------------------------------------------

    /// Restart the clock when a worker picks the trial up
    pub(crate) fn start(&mut self) {
        self.datetime_start = Utc::now();
        self.started_at = Some(Instant::now());
    }

    fn finish(&mut self, state: TrialState) {
        self.state = state;
        self.datetime_complete = Some(Utc::now());
        self.duration_ms = self.started_at.map(|t| t.elapsed().as_millis() as u64);
        self.pruning = None;
        self.shared_best = None;
    }

    /// Mark completed with the objective's score
    pub(crate) fn complete(&mut self, raw_score: f64) {
        if self.state.is_terminal() {
            return;
        }
        self.raw_score = Some(raw_score);
        self.score = Some(raw_score);
        self.finish(TrialState::Completed);
    }

    /// Mark pruned; the partial score is the last reported value
    pub(crate) fn prune(&mut self, fallback: f64) {
        if self.state.is_terminal() {
            return;
        }
        let partial = self.last_report().map_or(fallback, |(_, v)| v);
        self.raw_score = Some(partial);
        self.score = Some(partial);
        self.finish(TrialState::Pruned);
    }

    /// Mark failed; failed trials carry no score
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.score = None;
        if self.state.is_terminal() {
            self.state = TrialState::Failed;
            return;
        }
        self.finish(TrialState::Failed);
    }

    /// Replace the score with its regularized value
    pub(crate) fn set_score(&mut self, score: f64) {
        if self.state != TrialState::Failed {
            self.score = Some(score);
        }
    }
}
