//! Append-only experiment log
//!
//! Objectives receive a shared `SessionLog` by capture and write progress
//! lines to it while they train. Every line is echoed through `log::info!`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use super::Result;

const RULE_WIDTH: usize = 90;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

/// Messages between "still running" blocks
pub const PERIODIC_EVERY: usize = 100;

/// Messages carrying this marker can trigger a periodic block
pub const PERIODIC_MARKER: &str = "Intermediate Optimization";

fn now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug)]
struct LogState {
    file: File,
    count: usize,
}

/// Text log for one optimization session
///
/// Thread-safe: concurrent trials may log through the same handle; each call
/// writes its block atomically with respect to the others.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl SessionLog {
    /// Open (or append to) the log at `path` and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        write!(
            file,
            "Log file: {}\nCreated on: {}\n{}\n\n",
            path.display(),
            now(),
            rule('-')
        )?;
        Ok(Self { path, state: Mutex::new(LogState { file, count: 0 }) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of messages logged so far
    pub fn count(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    /// Append one message
    ///
    /// Every 100th message that mentions an intermediate optimization result
    /// is followed by a "still running" block.
    pub fn log(&self, message: &str) -> Result<()> {
        log::info!("{message}");
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(state.file, "{message}")?;
        state.count += 1;
        if state.count % PERIODIC_EVERY == 0 && message.contains(PERIODIC_MARKER) {
            let count = state.count;
            let tilde = rule('~');
            write!(
                state.file,
                "\n\n{tilde}\nPERIODIC LOG\n\nState: Still Running\nLog Count: {count}\nDate: {}\n{tilde}\n\n",
                now()
            )?;
        }
        Ok(())
    }

    /// Append an error block, including the error's source chain
    pub fn err(&self, error: &dyn std::error::Error) -> Result<()> {
        log::error!("{error}");
        let (warn, dash) = (rule('!'), rule('-'));
        let mut block = format!("\n\n{warn}\n{dash}\nERROR: {error}\n");
        let mut source = error.source();
        while let Some(cause) = source {
            block.push_str(&format!("Caused by: {cause}\n"));
            source = cause.source();
        }
        block.push_str(&format!("\n{dash}\n{warn}\n\n"));

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.file.write_all(block.as_bytes())?;
        Ok(())
    }

    /// Append a highlighted test block
    pub fn test(&self, message: &str) -> Result<()> {
        log::warn!("TEST: {message}");
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let line = rule('?');
        write!(state.file, "\n\n{line}\nTEST: {message}\n{line}\n\n")?;
        Ok(())
    }

    /// Write the footer
    pub fn end_log(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        write!(
            state.file,
            "\n\n{}\n\nEnd of Log File.\nTerminated on: {}\n",
            rule('-'),
            now()
        )?;
        state.file.flush()?;
        Ok(())
    }
}
