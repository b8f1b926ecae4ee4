//! In-process adapter
//!
//! Implements the same contract as the HTTP adapters. Clones share state, so
//! a test can keep a handle and inspect or sabotage the backend while the
//! orchestrator owns another clone. [`MemoryBackend::sharing`] gives a second
//! storage path onto the same row with its own failures and counters. Writes
//! store the normalized form of the document, the way the hosted gateway
//! canonicalises rows.

use crate::adapter::BackendAdapter;
use crate::error::{BackendError, BackendKind};
use async_trait::async_trait;
use layerconf_document::StoredDocument;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    read_failure: Option<BackendError>,
    write_failure: Option<BackendError>,
    reads: usize,
    writes: usize,
}

/// Shared in-memory stored document
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    kind: BackendKind,
    configured: bool,
    row: Arc<Mutex<Option<StoredDocument>>>,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Empty backend (reads report `NotFound`)
    #[must_use]
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            configured: true,
            row: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Backend holding `document`
    #[must_use]
    pub fn with_document(kind: BackendKind, document: StoredDocument) -> Self {
        let backend = Self::new(kind);
        backend.set_document(document);
        backend
    }

    /// Another storage path of `kind` onto the same row
    ///
    /// The row is shared; injected failures and counters are not.
    #[must_use]
    pub fn sharing(&self, kind: BackendKind) -> Self {
        Self {
            kind,
            configured: true,
            row: Arc::clone(&self.row),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Backend reporting itself as unconfigured
    #[must_use]
    pub fn unconfigured(kind: BackendKind) -> Self {
        Self {
            configured: false,
            ..Self::new(kind)
        }
    }

    /// Fail every read with `error` until cleared
    pub fn fail_reads(&self, error: BackendError) {
        self.state.lock().read_failure = Some(error);
    }

    /// Fail every write with `error` until cleared
    pub fn fail_writes(&self, error: BackendError) {
        self.state.lock().write_failure = Some(error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.read_failure = None;
        state.write_failure = None;
    }

    /// Currently stored document
    #[must_use]
    pub fn document(&self) -> Option<StoredDocument> {
        self.row.lock().clone()
    }

    /// Replace the stored document out of band
    pub fn set_document(&self, document: StoredDocument) {
        *self.row.lock() = Some(document);
    }

    #[must_use]
    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    fn unavailable(&self) -> BackendError {
        BackendError::unavailable(self.kind, "memory backend not configured")
    }
}

#[async_trait]
impl BackendAdapter for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn read(&self) -> Result<StoredDocument, BackendError> {
        if !self.configured {
            return Err(self.unavailable());
        }
        {
            let mut state = self.state.lock();
            state.reads += 1;
            if let Some(error) = &state.read_failure {
                return Err(error.clone());
            }
        }
        self.document().ok_or(BackendError::NotFound { backend: self.kind })
    }

    async fn write(&self, document: &StoredDocument) -> Result<(), BackendError> {
        if !self.configured {
            return Err(self.unavailable());
        }
        {
            let mut state = self.state.lock();
            state.writes += 1;
            if let Some(error) = &state.write_failure {
                return Err(error.clone());
            }
        }
        self.set_document(document.normalized());
        Ok(())
    }
}
