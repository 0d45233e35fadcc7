//! Append-only JSON lines log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::snapshot::GlobalSnapshot;
use crate::monitor::AvailabilityEvent;

/// Error type for log writes.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("log {0} is closed")]
    Closed(PathBuf),
}

impl PersistError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PersistError::Io { .. } => "io",
            PersistError::Serialize(_) => "serialize",
            PersistError::Closed(_) => "closed",
        }
    }
}

/// One line of the global log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    Snapshot(GlobalSnapshot),
    Event(AvailabilityEvent),
}

/// An append-only file of JSON records, one per line.
///
/// Every append is flushed before returning. Once closed, appends fail.
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonLinesLog {
    /// Open (or create) the file for appending, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| PersistError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        Ok(Self {
            writer: Mutex::new(Some(BufWriter::new(file))),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard
            .as_mut()
            .ok_or_else(|| PersistError::Closed(self.path.clone()))?;
        writer
            .write_all(&line)
            .and_then(|_| writer.flush())
            .map_err(|source| PersistError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Flush and close. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), PersistError> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(mut writer) => writer.flush().map_err(|source| PersistError::Io {
                path: self.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
