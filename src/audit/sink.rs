//! Audit sinks.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::audit::AuditRecord;
use crate::observability::metrics;

/// Failure to persist an audit record.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("audit queue full, record dropped")]
    QueueFull,

    #[error("audit writer stopped")]
    Closed,
}

/// Destination for audit records. Appends only.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Appends JSON lines to a file opened in append mode.
///
/// The file is opened on first use and reopened after a write error.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonLinesSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = record.to_json_line()?;
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = match guard.take() {
            Some(file) => file,
            None => OpenOptions::new().create(true).append(true).open(&self.path)?,
        };

        file.write_all(line.as_bytes())?;
        *guard = Some(file);
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records appended so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AuditSink for MemorySink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// Hands records to a background writer so callers never wait on IO.
///
/// Write failures in the background are logged and counted, never returned.
#[derive(Debug, Clone)]
pub struct QueuedSink {
    tx: mpsc::Sender<AuditRecord>,
}

impl QueuedSink {
    /// Spawn a blocking writer task draining into `inner`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(inner: Arc<dyn AuditSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditRecord>(capacity);
        tokio::task::spawn_blocking(move || {
            while let Some(record) = rx.blocking_recv() {
                if let Err(e) = inner.append(&record) {
                    metrics::record_audit_failure();
                    tracing::warn!(error = %e, client = %record.client_ip, "Failed to write audit record");
                }
            }
            tracing::debug!("Audit writer stopped");
        });
        Self { tx }
    }
}

impl AuditSink for QueuedSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.tx.try_send(record.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AuditError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => AuditError::Closed,
        })
    }
}
