//! Process-wide persistence diagnostics
//!
//! Records which backend served the last read and the last write, plus the
//! recent failures. One mutex guards the whole record; every update is a
//! short critical section with no I/O.
//!
//! [`DiagnosticsState::global`] is the shared instance used by the server.
//! Tests build their own with [`DiagnosticsState::new`] and inject it into the
//! orchestrator.

use chrono::{DateTime, Utc};
use layerconf_backend::{BackendError, BackendKind};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of read failures kept
pub const READ_ERROR_CAPACITY: usize = 64;

static GLOBAL: Lazy<Arc<DiagnosticsState>> = Lazy::new(|| Arc::new(DiagnosticsState::new()));

/// Backend that satisfied an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// No successful operation yet
    #[default]
    Unknown,
    Privileged,
    Constrained,
}

impl From<BackendKind> for DataSource {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Privileged => Self::Privileged,
            BackendKind::Constrained => Self::Constrained,
        }
    }
}

/// One failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub backend: BackendKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEntry {
    fn new(backend: BackendKind, error: &BackendError) -> Self {
        Self {
            backend,
            message: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Point-in-time copy of the diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsRecord {
    pub last_read_source: DataSource,
    pub last_persist_target: DataSource,
    /// Oldest first, bounded by [`READ_ERROR_CAPACITY`]
    pub read_errors: Vec<ErrorEntry>,
    pub write_error: Option<ErrorEntry>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub last_write_at: Option<DateTime<Utc>>,
}

impl DiagnosticsRecord {
    /// Whether any read has succeeded
    #[inline]
    #[must_use]
    pub fn has_read(&self) -> bool {
        self.last_read_source != DataSource::Unknown
    }
}

#[derive(Debug, Default)]
struct Inner {
    last_read_source: DataSource,
    last_persist_target: DataSource,
    read_errors: VecDeque<ErrorEntry>,
    write_error: Option<ErrorEntry>,
    last_read_at: Option<DateTime<Utc>>,
    last_write_at: Option<DateTime<Utc>>,
    read_attempts: u64,
}

/// Mutex-guarded diagnostics record
#[derive(Debug, Default)]
pub struct DiagnosticsState {
    inner: Mutex<Inner>,
}

impl DiagnosticsState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared process-wide instance
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Record the outcome of one read attempt
    pub fn record_read_attempt(&self, backend: BackendKind, outcome: Result<(), &BackendError>) {
        let mut inner = self.inner.lock();
        inner.read_attempts += 1;
        match outcome {
            Ok(()) => {
                inner.last_read_source = backend.into();
                inner.last_read_at = Some(Utc::now());
            }
            Err(error) => {
                if inner.read_errors.len() == READ_ERROR_CAPACITY {
                    inner.read_errors.pop_front();
                }
                inner.read_errors.push_back(ErrorEntry::new(backend, error));
            }
        }
    }

    /// Record the outcome of one write attempt
    ///
    /// A failure replaces `write_error`; a success clears it. When every
    /// adapter fails, `write_error` is left holding the last attempt.
    pub fn record_write_attempt(&self, backend: BackendKind, outcome: Result<(), &BackendError>) {
        let mut inner = self.inner.lock();
        match outcome {
            Ok(()) => {
                inner.last_persist_target = backend.into();
                inner.last_write_at = Some(Utc::now());
                inner.write_error = None;
            }
            Err(error) => inner.write_error = Some(ErrorEntry::new(backend, error)),
        }
    }

    /// Whether any read has been attempted, successful or not
    #[must_use]
    pub fn read_attempted(&self) -> bool {
        self.inner.lock().read_attempts > 0
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsRecord {
        let inner = self.inner.lock();
        DiagnosticsRecord {
            last_read_source: inner.last_read_source,
            last_persist_target: inner.last_persist_target,
            read_errors: inner.read_errors.iter().cloned().collect(),
            write_error: inner.write_error.clone(),
            last_read_at: inner.last_read_at,
            last_write_at: inner.last_write_at,
        }
    }
}
