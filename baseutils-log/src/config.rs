//! Logging configuration and level names.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::Level;

/// Where and how verbosely to log.
///
/// Levels are given by name, case-insensitively: `CRITICAL`, `ERROR`,
/// `WARNING` (or `WARN`), `NOTICE`, `INFO`, `DEBUG` and `TRACE`. An unknown
/// main level falls back to `INFO`, an unknown error level to `WARNING`.
///
/// ```
/// use baseutils_log::LogConfig;
/// use tracing::Level;
///
/// let config = LogConfig::default().with_level("notice").with_err_level("loud");
/// assert_eq!(config.level(), Level::INFO);
/// assert_eq!(config.err_level(), Level::WARN);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file. Without one the main output goes to stdout.
    pub path: Option<PathBuf>,
    /// Lowest level written to the main output.
    pub level: String,
    /// Lowest level also written to stderr.
    pub err_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            level: "DEBUG".to_owned(),
            err_level: "WARNING".to_owned(),
        }
    }
}

impl LogConfig {
    /// Log to `path` with default levels.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::default().with_path(path)
    }

    /// Set the log file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the main level name.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the stderr level name.
    pub fn with_err_level(mut self, level: impl Into<String>) -> Self {
        self.err_level = level.into();
        self
    }

    /// Parsed main level.
    pub fn level(&self) -> Level {
        parse_level(&self.level).unwrap_or(Level::INFO)
    }

    /// Parsed stderr level.
    pub fn err_level(&self) -> Level {
        parse_level(&self.err_level).unwrap_or(Level::WARN)
    }
}

/// Maps a level name to a [`Level`].
///
/// `CRITICAL` maps to `ERROR` and `NOTICE` to `INFO`, the closest levels
/// `tracing` has.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => Some(Level::ERROR),
        "WARNING" | "WARN" => Some(Level::WARN),
        "NOTICE" | "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// A level that can be changed while subscribers are running.
#[derive(Debug)]
pub(crate) struct SharedLevel(AtomicU8);

impl SharedLevel {
    pub(crate) fn new(level: Level) -> Self {
        Self(AtomicU8::new(encode(level)))
    }

    pub(crate) fn get(&self) -> Level {
        decode(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, level: Level) {
        self.0.store(encode(level), Ordering::Relaxed);
    }

    pub(crate) fn enables(&self, level: &Level) -> bool {
        *level <= self.get()
    }
}

fn encode(level: Level) -> u8 {
    match level {
        Level::ERROR => 0,
        Level::WARN => 1,
        Level::INFO => 2,
        Level::DEBUG => 3,
        _ => 4,
    }
}

fn decode(code: u8) -> Level {
    match code {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
