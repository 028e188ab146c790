#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{Level, Metadata, Subscriber, debug};
use tracing_subscriber::filter::{self, FilterFn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry, fmt};

pub mod config;
pub mod error;
pub mod format;
pub mod writer;

#[doc(inline)]
pub use crate::config::{LogConfig, parse_level};
#[doc(inline)]
pub use crate::error::LogError;
#[doc(inline)]
pub use crate::format::LineFormat;
#[doc(inline)]
pub use crate::writer::{LogFile, LogFileWriter};

use crate::config::SharedLevel;

/// Builds a subscriber for `config` without installing it.
///
/// The main output is the configured file (no ANSI colors) or, without a
/// path, stdout. Events at the error level or above are written to stderr as
/// well. The returned [`LogHandle`] changes levels and reopens the file while
/// the subscriber is in use.
pub fn build(
    config: &LogConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogHandle), LogError> {
    let main = Arc::new(SharedLevel::new(config.level()));
    let alert = Arc::new(SharedLevel::new(config.err_level()));
    let file = config
        .path
        .as_ref()
        .map(|path| LogFile::open(path))
        .transpose()?;

    let file_layer = file.clone().map(|file| {
        fmt::layer()
            .event_format(LineFormat)
            .with_ansi(false)
            .with_writer(file)
            .with_filter(level_filter(Arc::clone(&main)))
    });
    let stdout_layer = file.is_none().then(|| {
        fmt::layer()
            .event_format(LineFormat)
            .with_ansi(true)
            .with_writer(io::stdout)
            .with_filter(level_filter(Arc::clone(&main)))
    });
    let stderr_layer = fmt::layer()
        .event_format(LineFormat)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(level_filter(Arc::clone(&alert)));

    let subscriber = Registry::default()
        .with(file_layer)
        .with(stdout_layer)
        .with(stderr_layer);

    Ok((subscriber, LogHandle { main, alert, file }))
}

/// Builds a subscriber for `config` and installs it as the global default.
///
/// Fails with [`LogError::AlreadyInitialized`] if a global subscriber exists.
/// Use [`LogHandle::reload`] to apply a changed configuration later.
pub fn init(config: &LogConfig) -> Result<LogHandle, LogError> {
    let (subscriber, handle) = build(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LogError::AlreadyInitialized)?;
    Ok(handle)
}

fn level_filter(level: Arc<SharedLevel>) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    filter::filter_fn(move |meta| level.enables(meta.level()))
}

/// Runtime control over a built subscriber.
#[derive(Debug, Clone)]
pub struct LogHandle {
    main: Arc<SharedLevel>,
    alert: Arc<SharedLevel>,
    file: Option<LogFile>,
}

impl LogHandle {
    /// Applies the levels of `config` and reopens its log file.
    ///
    /// Reopening happens even when the path is unchanged, so an externally
    /// rotated file is replaced by a fresh one. Writes already in progress
    /// finish on the old file. Switching between file and stdout output is
    /// rejected with [`LogError::SinkMismatch`] and changes nothing.
    pub fn reload(&self, config: &LogConfig) -> Result<(), LogError> {
        match (&self.file, &config.path) {
            (Some(file), Some(path)) => file.reopen(path)?,
            (None, None) => {}
            _ => return Err(LogError::SinkMismatch),
        }
        self.main.set(config.level());
        self.alert.set(config.err_level());
        debug!(
            level = %config.level(),
            err_level = %config.err_level(),
            path = ?config.path,
            "Logging reloaded"
        );
        Ok(())
    }

    /// Current main level.
    pub fn level(&self) -> Level {
        self.main.get()
    }

    /// Current stderr level.
    pub fn err_level(&self) -> Level {
        self.alert.get()
    }

    /// Active log file, if output goes to a file.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_ref().map(LogFile::path)
    }
}
