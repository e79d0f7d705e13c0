//! Logging utilities for CLI output

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// Level selected by the global `--quiet` / `--verbose` flags
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    /// Default `env_logger` filter for this level
    pub fn env_filter(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "debug",
        }
    }
}

/// Whether a message at `required` is shown at `level`
pub fn enabled(level: LogLevel, required: LogLevel) -> bool {
    level != LogLevel::Quiet && (level == required || required == LogLevel::Normal)
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if enabled(level, required) {
        println!("{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(LogLevel::from_flags(true, true), LogLevel::Quiet);
        assert_eq!(LogLevel::from_flags(false, true), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(false, false), LogLevel::Normal);
    }

    #[test]
    fn test_enabled() {
        assert!(enabled(LogLevel::Normal, LogLevel::Normal));
        assert!(!enabled(LogLevel::Normal, LogLevel::Verbose));
        assert!(enabled(LogLevel::Verbose, LogLevel::Normal));
        assert!(enabled(LogLevel::Verbose, LogLevel::Verbose));
        assert!(!enabled(LogLevel::Quiet, LogLevel::Normal));
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(LogLevel::Quiet.env_filter(), "error");
        assert_eq!(LogLevel::Verbose.env_filter(), "debug");
    }
}
