//! Study runner

use std::path::Path;
use std::sync::Arc;

use crate::optim::hpo::{PsoEngine, PsoResult};

use super::session_log::{SessionLog, PERIODIC_MARKER};
use super::storage::{CsvTxtSink, RecordSink, StudySummary};
use super::{check_study_name, Result, TrackingError};

/// Drives one engine run and persists every generation
///
/// The engine is run exactly once. A persistence failure does not interrupt
/// the search: later generations are still evaluated, and the first sink
/// error is returned once the run is over.
#[derive(Debug)]
pub struct PsoRunner<S: RecordSink> {
    sink: S,
    session: u32,
    metric_to_follow: Option<String>,
    session_log: Option<Arc<SessionLog>>,
}

impl PsoRunner<CsvTxtSink> {
    /// Runner writing `{study}_{session}.csv` and `{study}_{session}.txt`
    pub fn new(csv_dir: impl AsRef<Path>, txt_dir: impl AsRef<Path>, session: u32) -> Self {
        Self::with_sink(CsvTxtSink::new(csv_dir, txt_dir, session), session)
    }
}

impl<S: RecordSink> PsoRunner<S> {
    pub fn with_sink(sink: S, session: u32) -> Self {
        Self { sink, session, metric_to_follow: None, session_log: None }
    }

    /// Report this user attribute of the best trial in the summary
    pub fn with_metric_to_follow(mut self, key: impl Into<String>) -> Self {
        self.metric_to_follow = Some(key.into());
        self
    }

    /// Mirror progress into a session log
    pub fn with_session_log(mut self, log: Arc<SessionLog>) -> Self {
        self.session_log = Some(log);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    /// Run `engine` to termination under `study_name`
    pub fn run(&mut self, engine: &mut PsoEngine, study_name: &str) -> Result<PsoResult> {
        check_study_name(study_name)?;
        self.note(&format!("Starting study {study_name} (session {})", self.session));

        let mut sink_error: Option<TrackingError> = None;
        let sink = &mut self.sink;
        let session_log = self.session_log.as_deref();
        let outcome = engine.run(|report| {
            if let Some(log) = session_log {
                let best = report.best_score.map_or_else(|| "unset".to_string(), |s| format!("{s:.6}"));
                let line = format!(
                    "{PERIODIC_MARKER} | generation {}: {} completed, {} pruned, {} failed, best {best}",
                    report.generation, report.completed, report.pruned, report.failed
                );
                if let Err(e) = log.log(&line) {
                    log::warn!("session log write failed: {e}");
                }
            }
            if sink_error.is_some() {
                return;
            }
            if let Err(e) = sink.record_generation(study_name, report) {
                log::warn!("generation {} not persisted: {e}", report.generation);
                sink_error = Some(e);
            }
        });

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                let err = TrackingError::from(e);
                self.note_error(&err);
                return Err(err);
            }
        };

        let summary = StudySummary {
            study_name,
            session: self.session,
            direction: engine.config().direction,
            config: engine.config(),
            result: &result,
            metric_to_follow: self.metric_to_follow.as_deref(),
            pruner: engine.pruner_name(),
            regularizer: engine.regularizer_name(),
        };
        if let Err(e) = self.sink.finish(&summary) {
            log::warn!("summary not persisted: {e}");
            sink_error.get_or_insert(e);
        }

        self.note(&format!(
            "Finished study {study_name}: {} ({} generations, best {})",
            result.termination,
            result.generations(),
            result.best_score().map_or_else(|| "unset".to_string(), |s| format!("{s:.6}"))
        ));
        if let Some(log) = &self.session_log {
            if let Err(e) = log.end_log() {
                log::warn!("session log write failed: {e}");
            }
        }

        match sink_error {
            Some(e) => {
                self.note_error(&e);
                Err(e)
            }
            None => Ok(result),
        }
    }

    fn note(&self, message: &str) {
        match &self.session_log {
            Some(log) => {
                if let Err(e) = log.log(message) {
                    log::warn!("session log write failed: {e}");
                }
            }
            None => log::info!("{message}"),
        }
    }

    fn note_error(&self, error: &TrackingError) {
        match &self.session_log {
            Some(log) => {
                if let Err(e) = log.err(error) {
                    log::warn!("session log write failed: {e}");
                }
            }
            None => log::error!("{error}"),
        }
    }
}
