//! Tests for the tracking module

use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use super::storage::{CsvTxtSink, InMemorySink, RecordSink, StudySummary};
use super::{check_study_name, PsoRunner, SessionLog, TrackingError, TrialRecord};
use crate::optim::hpo::{
    Architecture, EvaluationError, GenerationReport, HPOError, HyperparameterSpace,
    ParameterDomain, ParameterValue, PsoConfig, PsoEngine, Trial, TrialState,
};

fn lr_trial(particle_id: usize, generation: usize, lr: f64) -> Trial {
    let mut params = HashMap::new();
    params.insert("lr".to_string(), ParameterValue::Float(lr));
    params.insert("optimizer".to_string(), ParameterValue::Categorical("adam".to_string()));
    Trial::new(particle_id, generation, params, vec![lr, 0.5])
}

fn report(generation: usize, trials: Vec<Trial>) -> GenerationReport {
    GenerationReport {
        generation,
        completed: trials.iter().filter(|t| t.state() == TrialState::Completed).count(),
        pruned: trials.iter().filter(|t| t.state() == TrialState::Pruned).count(),
        failed: trials.iter().filter(|t| t.state() == TrialState::Failed).count(),
        best_score: trials.iter().filter_map(Trial::score).reduce(f64::max),
        best_params: None,
        improved: true,
        duration_ms: 1,
        trials,
    }
}

fn engine(particles: usize, generations: usize) -> PsoEngine {
    let mut space = HyperparameterSpace::new();
    space.add("x", ParameterDomain::continuous(0.0, 1.0)).unwrap();
    let objective = |trial: &mut Trial| -> Result<f64, EvaluationError> {
        let x = trial.param_f64("x").unwrap_or_default();
        trial.set_user_attr("accuracy", 0.5 + x / 2.0);
        Ok(x)
    };
    PsoEngine::new(space, PsoConfig::new(particles, generations).with_workers(1), objective)
        .unwrap()
}

// ---------------------------------------------------------------------------
// TrialRecord tests
// ---------------------------------------------------------------------------

#[test]
fn test_trial_record_from_completed_trial() {
    let mut trial = lr_trial(2, 1, 0.01);
    trial.set_architecture(Architecture::mlp(784, &[64], 10));
    trial.set_user_attr("accuracy", 0.91);
    trial.complete(0.91);

    let record = TrialRecord::from(&trial);
    assert_eq!(record.generation, 1);
    assert_eq!(record.particle_id, 2);
    assert_eq!(record.params["lr"], "0.01");
    assert_eq!(record.params["optimizer"], "adam");
    assert_eq!(record.score, Some(0.91));
    assert_eq!(record.raw_score, Some(0.91));
    assert_eq!(record.state, TrialState::Completed);
    assert_eq!(record.user_attrs["network"], "[784, 64, 10]");
    assert_eq!(record.user_attrs["accuracy"], "0.91");
    assert!(record.error.is_none());
    assert!(record.datetime_complete.is_some());
    assert!(record.duration_ms.is_some());
}

#[test]
fn test_trial_record_from_failed_trial() {
    let mut trial = lr_trial(0, 0, 0.1);
    trial.fail("objective panicked: boom");

    let record = TrialRecord::from(&trial);
    assert_eq!(record.state, TrialState::Failed);
    assert!(record.score.is_none());
    assert_eq!(record.error.as_deref(), Some("objective panicked: boom"));
}

#[test]
fn test_trial_record_serde_roundtrip() {
    let mut trial = lr_trial(1, 0, 0.05);
    trial.complete(0.7);
    let record = TrialRecord::from(&trial);
    let json = serde_json::to_string(&record).unwrap();
    let back: TrialRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

#[test]
fn test_check_study_name() {
    assert!(check_study_name("mnist_pso").is_ok());
    assert!(check_study_name("run-2024.v1").is_ok());
    for bad in ["", ".", "..", "a/b", "a\\b", "tab\there"] {
        assert!(
            matches!(check_study_name(bad), Err(TrackingError::InvalidStudyName(_))),
            "{bad:?} should be rejected"
        );
    }
}

// ---------------------------------------------------------------------------
// Sink tests
// ---------------------------------------------------------------------------

#[test]
fn test_in_memory_sink_collects_generations() {
    let mut sink = InMemorySink::new();
    let mut a = lr_trial(0, 0, 0.1);
    a.complete(0.5);
    let mut b = lr_trial(1, 0, 0.2);
    b.fail("bad");
    sink.record_generation("study", &report(0, vec![a, b])).unwrap();

    assert_eq!(sink.generations(), 1);
    assert_eq!(sink.records().len(), 2);
    assert_eq!(sink.records()[1].state, TrialState::Failed);
    assert!(sink.record_generation("bad/name", &report(1, vec![])).is_err());
}

#[test]
fn test_csv_sink_header_rows_and_extra_attrs() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvTxtSink::new(dir.path().join("csv"), dir.path().join("txt"), 1);

    let mut first = lr_trial(0, 0, 0.1);
    first.set_user_attr("accuracy", 0.8);
    first.complete(0.8);
    sink.record_generation("mnist", &report(0, vec![first])).unwrap();

    let mut second = lr_trial(0, 1, 0.2);
    second.set_user_attr("accuracy", 0.85);
    second.set_user_attr("epochs", 5usize);
    second.complete(0.85);
    sink.record_generation("mnist", &report(1, vec![second])).unwrap();

    let csv = std::fs::read_to_string(sink.csv_path("mnist")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "generation,particle_id,hp_lr,hp_optimizer,score,raw_score,state,\
         user_attrs_accuracy,user_attrs,duration_ms,datetime_start,datetime_complete"
    );
    assert!(lines[1].starts_with("0,0,0.1,adam,0.8,0.8,COMPLETE,0.8,,"));
    // Keys first seen after the header fold into the trailing column
    assert!(lines[2].starts_with("1,0,0.2,adam,0.85,0.85,COMPLETE,0.85,epochs=5,"));
}

#[test]
fn test_csv_sink_quotes_sequence_attrs() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvTxtSink::new(dir.path(), dir.path(), 3);
    let mut trial = lr_trial(0, 0, 0.1);
    trial.set_architecture(Architecture::mlp(784, &[32, 16], 10));
    trial.complete(0.5);
    sink.record_generation("arch", &report(0, vec![trial])).unwrap();

    let csv = std::fs::read_to_string(dir.path().join("arch_3.csv")).unwrap();
    assert!(csv.lines().next().unwrap().contains("user_attrs_network"));
    assert!(csv.contains("\"[784, 32, 16, 10]\""));
}

#[test]
fn test_csv_sink_output_reads_back_with_embedded_quotes() {
    let dir = TempDir::new().unwrap();
    let mut sink = CsvTxtSink::new(dir.path(), dir.path(), 1);
    let mut trial = lr_trial(0, 0, 0.1);
    trial.set_user_attr("note", "said \"stop\", then\nstopped");
    trial.complete(0.5);
    sink.record_generation("notes", &report(0, vec![trial])).unwrap();

    let mut reader = csv::Reader::from_path(dir.path().join("notes_1.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    let column = headers.iter().position(|h| h == "user_attrs_note").unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), headers.len());
    assert_eq!(&rows[0][column], "said \"stop\", then\nstopped");
}

#[test]
fn test_csv_sink_truncates_on_new_study() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("s_1.csv");

    for _ in 0..2 {
        let mut sink = CsvTxtSink::new(dir.path(), dir.path(), 1);
        let mut trial = lr_trial(0, 0, 0.1);
        trial.complete(0.1);
        sink.record_generation("s", &report(0, vec![trial])).unwrap();
    }
    let csv = std::fs::read_to_string(path).unwrap();
    assert_eq!(csv.lines().count(), 2);
}

// ---------------------------------------------------------------------------
// Runner tests
// ---------------------------------------------------------------------------

#[test]
fn test_runner_forwards_every_generation() {
    let mut engine = engine(3, 4);
    let mut runner = PsoRunner::with_sink(InMemorySink::new(), 2).with_metric_to_follow("accuracy");
    let result = runner.run(&mut engine, "demo").unwrap();

    assert_eq!(result.generations(), 4);
    assert_eq!(runner.session(), 2);
    let sink = runner.into_sink();
    assert_eq!(sink.generations(), 4);
    assert_eq!(sink.records().len(), 12);
    assert_eq!(sink.summaries().len(), 1);

    let summary = &sink.summaries()[0];
    assert!(summary.contains("Study: demo"));
    assert!(summary.contains("Session: 2"));
    assert!(summary.contains("Best accuracy: "));
    assert!(summary.contains("Termination: max generations reached"));
    assert!(summary.contains("Total failures: 0"));
}

#[test]
fn test_runner_rejects_bad_study_name_before_running() {
    let mut engine = engine(2, 2);
    let mut runner = PsoRunner::with_sink(InMemorySink::new(), 1);
    let err = runner.run(&mut engine, "../x").unwrap_err();
    assert!(matches!(err, TrackingError::InvalidStudyName(_)));
    assert!(engine.reports().is_empty());
}

#[derive(Debug, Default)]
struct FlakySink {
    fail_on: usize,
    calls: usize,
    finished: bool,
}

impl RecordSink for FlakySink {
    fn record_generation(&mut self, _study: &str, report: &GenerationReport) -> super::Result<()> {
        self.calls += 1;
        if report.generation == self.fail_on {
            return Err(std::io::Error::other("disk full").into());
        }
        Ok(())
    }

    fn finish(&mut self, _summary: &StudySummary<'_>) -> super::Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[test]
fn test_runner_sink_error_is_returned_after_run() {
    let mut engine = engine(2, 3);
    let mut runner = PsoRunner::with_sink(FlakySink { fail_on: 1, ..Default::default() }, 1);
    let err = runner.run(&mut engine, "flaky").unwrap_err();

    assert!(matches!(err, TrackingError::Io(_)));
    // The search itself ran to completion
    assert!(engine.is_finished());
    assert_eq!(engine.reports().len(), 3);
    // Persistence stops at the first failure; the summary is still attempted
    assert_eq!(runner.sink().calls, 2);
    assert!(runner.sink().finished);
}

#[test]
fn test_runner_writes_csv_txt_and_log() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(SessionLog::create(dir.path().join("log").join("session.log")).unwrap());
    let mut engine = engine(2, 2);
    let mut runner = PsoRunner::new(dir.path().join("csv"), dir.path().join("txt"), 5)
        .with_session_log(Arc::clone(&log));
    runner.run(&mut engine, "full").unwrap();

    let csv = std::fs::read_to_string(dir.path().join("csv").join("full_5.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1 + 2 * 2);
    let txt = std::fs::read_to_string(dir.path().join("txt").join("full_5.txt")).unwrap();
    assert!(txt.contains("Best hyperparameters:"));
    assert!(txt.contains("  x: "));

    let text = std::fs::read_to_string(log.path()).unwrap();
    assert!(text.contains("Starting study full (session 5)"));
    assert!(text.contains("Intermediate Optimization | generation 1"));
    assert!(text.contains("End of Log File."));
}

// ---------------------------------------------------------------------------
// SessionLog tests
// ---------------------------------------------------------------------------

#[test]
fn test_session_log_header_and_footer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("run.log");
    let log = SessionLog::create(&path).unwrap();
    log.log("hello").unwrap();
    log.test("sanity check").unwrap();
    log.end_log().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Log file: "));
    assert!(text.contains("Created on: "));
    assert!(text.contains(&"-".repeat(90)));
    assert!(text.contains("\nhello\n"));
    assert!(text.contains("TEST: sanity check"));
    assert!(text.contains("End of Log File.\nTerminated on: "));
    assert_eq!(log.count(), 1);
}

#[test]
fn test_session_log_periodic_block() {
    let dir = TempDir::new().unwrap();
    let log = SessionLog::create(dir.path().join("p.log")).unwrap();
    for i in 0..99 {
        log.log(&format!("trial {i}")).unwrap();
    }
    log.log("Intermediate Optimization | generation 3").unwrap();
    // Unmarked messages never trigger the block
    for i in 0..100 {
        log.log(&format!("more {i}")).unwrap();
    }

    let text = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(text.matches("PERIODIC LOG").count(), 1);
    assert!(text.contains("Log Count: 100"));
    assert_eq!(log.count(), 200);
}

#[test]
fn test_session_log_error_chain() {
    let dir = TempDir::new().unwrap();
    let log = SessionLog::create(dir.path().join("e.log")).unwrap();
    let err = TrackingError::from(HPOError::EvaluationFailure("loss diverged".to_string()));
    log.err(&err).unwrap();

    let text = std::fs::read_to_string(log.path()).unwrap();
    assert!(text.contains(&"!".repeat(90)));
    assert!(text.contains("ERROR: Search failed: "));
    assert!(text.contains("Caused by: "));
    assert!(text.contains("loss diverged"));
}

#[test]
fn test_session_log_appends_across_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.log");
    SessionLog::create(&path).unwrap().log("first").unwrap();
    SessionLog::create(&path).unwrap().log("second").unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("Log file: ").count(), 2);
    assert!(text.find("first").unwrap() < text.find("second").unwrap());
}
