//! Error type for logging setup.

use std::path::PathBuf;

/// Errors raised while installing or reloading logging.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file could not be opened.
    #[error("Failed to open log file {path:?}: {source}")]
    Io {
        /// File that was being opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("A global logger is already installed")]
    AlreadyInitialized,

    /// A reload asked to switch between file and stdout output.
    ///
    /// The output kind is fixed when the subscriber is built; only the file
    /// path and the levels can change afterwards.
    #[error("Cannot switch log output between file and stdout on reload")]
    SinkMismatch,
}
