//! Storage adapter contract
//!
//! Every adapter reads and writes one [`StoredDocument`] per deployment.
//! Adapters are stateless, hold no cache and are safe to call concurrently.

use crate::error::{BackendError, BackendKind};
use async_trait::async_trait;
use layerconf_document::StoredDocument;

/// Read/write contract shared by every storage path
#[async_trait]
pub trait BackendAdapter: Send + Sync + std::fmt::Debug {
    /// Storage path identity, used for diagnostics
    fn kind(&self) -> BackendKind;

    /// Whether the adapter has the endpoint and credential it needs
    ///
    /// An unconfigured adapter fails every call with `Unavailable` without
    /// doing any I/O.
    fn is_configured(&self) -> bool;

    /// Read the stored document
    ///
    /// # Errors
    /// `Unavailable`, `PermissionDenied` or `NotFound`
    async fn read(&self) -> Result<StoredDocument, BackendError>;

    /// Replace the stored document
    ///
    /// # Errors
    /// `Unavailable`, `PermissionDenied` or `Conflict`
    async fn write(&self, document: &StoredDocument) -> Result<(), BackendError>;
}
