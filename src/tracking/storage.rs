//! Record sinks
//!
//! Provides the `RecordSink` trait, a CSV + TXT file implementation mirroring
//! the study output layout, and an in-memory implementation for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::optim::hpo::{Direction, GenerationReport, PsoConfig, PsoResult, UserAttr};

use super::{check_study_name, Result, TrialRecord};

/// Everything the end-of-run summary needs
#[derive(Debug, Clone, Copy)]
pub struct StudySummary<'a> {
    pub study_name: &'a str,
    pub session: u32,
    pub direction: Direction,
    pub config: &'a PsoConfig,
    pub result: &'a PsoResult,
    /// User attribute of the best trial to report alongside its score
    pub metric_to_follow: Option<&'a str>,
    pub pruner: Option<&'static str>,
    pub regularizer: Option<&'static str>,
}

impl StudySummary<'_> {
    /// Value of the followed metric on the best trial
    pub fn followed_metric(&self) -> Option<&UserAttr> {
        let key = self.metric_to_follow?;
        self.result.best_trial()?.user_attr(key)
    }

    /// Human-readable summary
    pub fn render(&self) -> String {
        let mut out = String::new();
        let config = self.config;
        let result = self.result;

        let _ = writeln!(out, "Study: {}", self.study_name);
        let _ = writeln!(out, "Session: {}", self.session);
        let _ = writeln!(out, "Direction: {}", self.direction);
        let _ = writeln!(
            out,
            "Swarm: {} particles, {}/{} generations, w={} c1={} c2={}, seed {}",
            config.num_particles,
            result.generations(),
            config.max_generations,
            config.inertia,
            config.cognitive,
            config.social,
            config.seed
        );
        let _ = writeln!(out, "Pruner: {}", self.pruner.unwrap_or("none"));
        let _ = writeln!(out, "Regularizer: {}", self.regularizer.unwrap_or("none"));
        let _ = writeln!(out, "Termination: {}", result.termination);
        out.push('\n');

        match &result.best {
            Some(best) => {
                let _ = writeln!(out, "Best score: {:.6}", best.score);
                let _ = writeln!(
                    out,
                    "Best trial: generation {}, particle {}",
                    best.generation, best.particle_id
                );
                out.push_str("Best hyperparameters:\n");
                let sorted: BTreeMap<_, _> = best.params.iter().collect();
                for (name, value) in sorted {
                    let _ = writeln!(out, "  {name}: {value}");
                }
                if let Some(key) = self.metric_to_follow {
                    let value = self
                        .followed_metric()
                        .map_or_else(|| "n/a".to_string(), ToString::to_string);
                    let _ = writeln!(out, "Best {key}: {value}");
                }
            }
            None => out.push_str("Best score: none (no trial produced a score)\n"),
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "{:<12}{:>11}{:>8}{:>8}  {}",
            "Generation", "Completed", "Pruned", "Failed", "Best"
        );
        for report in &result.reports {
            let best = report.best_score.map_or_else(|| "-".to_string(), |s| format!("{s:.6}"));
            let _ = writeln!(
                out,
                "{:<12}{:>11}{:>8}{:>8}  {}",
                report.generation, report.completed, report.pruned, report.failed, best
            );
        }
        let _ = writeln!(out, "Total failures: {}", result.total_failures);
        out
    }
}

/// Destination for generation records and the final summary
pub trait RecordSink {
    /// Persist every trial of a finished generation
    fn record_generation(&mut self, study_name: &str, report: &GenerationReport) -> Result<()>;

    /// Persist the end-of-run summary
    fn finish(&mut self, summary: &StudySummary<'_>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

/// Keeps records and rendered summaries in memory
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Vec<TrialRecord>,
    summaries: Vec<String>,
    generations: usize,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn summaries(&self) -> &[String] {
        &self.summaries
    }

    pub fn generations(&self) -> usize {
        self.generations
    }
}

impl RecordSink for InMemorySink {
    fn record_generation(&mut self, study_name: &str, report: &GenerationReport) -> Result<()> {
        check_study_name(study_name)?;
        self.records.extend(report.trials.iter().map(TrialRecord::from));
        self.generations += 1;
        Ok(())
    }

    fn finish(&mut self, summary: &StudySummary<'_>) -> Result<()> {
        self.summaries.push(summary.render());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CSV + TXT sink
// ---------------------------------------------------------------------------

const FIXED_LEADING: [&str; 2] = ["generation", "particle_id"];
const FIXED_SCORE: [&str; 3] = ["score", "raw_score", "state"];
const FIXED_TRAILING: [&str; 4] =
    ["user_attrs", "duration_ms", "datetime_start", "datetime_complete"];

/// Column layout fixed by the first generation written
#[derive(Debug, Clone)]
struct CsvLayout {
    params: Vec<String>,
    attrs: Vec<String>,
}

impl CsvLayout {
    fn from_records(records: &[TrialRecord]) -> Self {
        let params: BTreeSet<&String> = records.iter().flat_map(|r| r.params.keys()).collect();
        let attrs: BTreeSet<&String> = records.iter().flat_map(|r| r.user_attrs.keys()).collect();
        Self {
            params: params.into_iter().cloned().collect(),
            attrs: attrs.into_iter().cloned().collect(),
        }
    }

    fn header(&self) -> Vec<String> {
        let mut cols: Vec<String> = FIXED_LEADING.iter().map(|s| s.to_string()).collect();
        cols.extend(self.params.iter().map(|p| format!("hp_{p}")));
        cols.extend(FIXED_SCORE.iter().map(|s| s.to_string()));
        cols.extend(self.attrs.iter().map(|a| format!("user_attrs_{a}")));
        cols.extend(FIXED_TRAILING.iter().map(|s| s.to_string()));
        cols
    }

    fn row(&self, record: &TrialRecord) -> Vec<String> {
        let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let mut cols = vec![record.generation.to_string(), record.particle_id.to_string()];
        cols.extend(self.params.iter().map(|p| record.params.get(p).cloned().unwrap_or_default()));
        cols.push(opt(record.score));
        cols.push(opt(record.raw_score));
        cols.push(record.state.to_string());
        cols.extend(self.attrs.iter().map(|a| record.user_attrs.get(a).cloned().unwrap_or_default()));

        let extra: Vec<String> = record
            .user_attrs
            .iter()
            .filter(|(k, _)| !self.attrs.contains(*k))
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        cols.push(extra.join("; "));
        cols.push(record.duration_ms.map(|d| d.to_string()).unwrap_or_default());
        cols.push(record.datetime_start.clone());
        cols.push(record.datetime_complete.clone().unwrap_or_default());
        cols
    }
}

/// Writes `{study}_{session}.csv` into a CSV directory and
/// `{study}_{session}.txt` into a TXT directory
///
/// The CSV is truncated when the first generation of a study arrives and
/// appended to (and flushed) after every generation, so a crashed run still
/// leaves every finished generation on disk.
#[derive(Debug)]
pub struct CsvTxtSink {
    csv_dir: PathBuf,
    txt_dir: PathBuf,
    session: u32,
    writer: Option<(String, csv::Writer<BufWriter<File>>)>,
    layout: Option<CsvLayout>,
}

impl CsvTxtSink {
    pub fn new(csv_dir: impl AsRef<Path>, txt_dir: impl AsRef<Path>, session: u32) -> Self {
        Self {
            csv_dir: csv_dir.as_ref().to_path_buf(),
            txt_dir: txt_dir.as_ref().to_path_buf(),
            session,
            writer: None,
            layout: None,
        }
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    /// CSV path for a study
    pub fn csv_path(&self, study_name: &str) -> PathBuf {
        self.csv_dir.join(format!("{study_name}_{}.csv", self.session))
    }

    /// TXT summary path for a study
    pub fn txt_path(&self, study_name: &str) -> PathBuf {
        self.txt_dir.join(format!("{study_name}_{}.txt", self.session))
    }

    /// Start a fresh CSV unless `study_name` is the one already being written
    fn ensure_open(&mut self, study_name: &str) -> Result<()> {
        let current = self.writer.as_ref().is_some_and(|(name, _)| name == study_name);
        if !current {
            fs::create_dir_all(&self.csv_dir)?;
            let file = File::create(self.csv_path(study_name))?;
            let writer = csv::Writer::from_writer(BufWriter::new(file));
            self.writer = Some((study_name.to_string(), writer));
            self.layout = None;
        }
        Ok(())
    }
}

impl RecordSink for CsvTxtSink {
    fn record_generation(&mut self, study_name: &str, report: &GenerationReport) -> Result<()> {
        check_study_name(study_name)?;
        let records: Vec<TrialRecord> = report.trials.iter().map(TrialRecord::from).collect();

        self.ensure_open(study_name)?;
        let write_header = self.layout.is_none();
        let layout = self.layout.get_or_insert_with(|| CsvLayout::from_records(&records)).clone();

        if let Some((_, writer)) = &mut self.writer {
            if write_header {
                writer.write_record(layout.header())?;
            }
            for record in &records {
                writer.write_record(layout.row(record))?;
            }
            writer.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self, summary: &StudySummary<'_>) -> Result<()> {
        check_study_name(summary.study_name)?;
        if let Some((_, writer)) = &mut self.writer {
            writer.flush()?;
        }
        fs::create_dir_all(&self.txt_dir)?;
        fs::write(self.txt_path(summary.study_name), summary.render())?;
        Ok(())
    }
}
