//! Append-only log file that can be reopened at runtime.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing_subscriber::fmt::MakeWriter;

use crate::error::LogError;

#[derive(Debug)]
struct Current {
    path: PathBuf,
    file: Arc<File>,
}

/// Shared handle to the active log file.
///
/// Every write takes a reference to the file that is current at that moment.
/// [`reopen`](Self::reopen) swaps in a new file; the old one is closed once
/// the last write still holding it completes.
#[derive(Debug, Clone)]
pub struct LogFile {
    current: Arc<RwLock<Current>>,
}

impl LogFile {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self {
            current: Arc::new(RwLock::new(Current {
                path,
                file: Arc::new(file),
            })),
        })
    }

    /// Path of the active file.
    pub fn path(&self) -> PathBuf {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .path
            .clone()
    }

    /// Switches output to `path`. On failure the active file stays in use.
    pub fn reopen(&self, path: impl Into<PathBuf>) -> Result<(), LogError> {
        let path = path.into();
        let file = Arc::new(open_append(&path)?);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        current.path = path;
        current.file = file;
        Ok(())
    }

    fn file(&self) -> Arc<File> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .file
            .clone()
    }
}

fn open_append(path: &Path) -> Result<File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::Io {
            path: path.to_owned(),
            source,
        })
}

/// Writer for one formatted event.
#[derive(Debug)]
pub struct LogFileWriter {
    file: Arc<File>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.file).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.file).flush()
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter { file: self.file() }
    }
}
