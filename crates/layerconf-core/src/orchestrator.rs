//! Fallback persistence over an ordered adapter list
//!
//! Reads and writes try each configured adapter in order and stop at the
//! first success. Every attempt is recorded in [`DiagnosticsState`]; only when
//! all of them fail does the caller see [`SettingsError::StorageUnavailable`].
//! A failed read never degrades to a default document.

use crate::diagnostics::DiagnosticsState;
use crate::error::{Operation, SettingsError};
use layerconf_backend::{
    BackendAdapter, BackendConfig, BackendError, BackendKind, ConstrainedAdapter, PrivilegedAdapter,
    DEFAULT_TIMEOUT,
};
use layerconf_document::StoredDocument;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on one adapter attempt
    pub attempt_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

/// Ordered fallback over storage adapters
#[derive(Debug, Clone)]
pub struct PersistenceOrchestrator {
    adapters: Vec<Arc<dyn BackendAdapter>>,
    diagnostics: Arc<DiagnosticsState>,
    config: OrchestratorConfig,
}

impl PersistenceOrchestrator {
    /// Orchestrate `adapters` in the given order
    #[must_use]
    pub fn new(adapters: Vec<Arc<dyn BackendAdapter>>, diagnostics: Arc<DiagnosticsState>) -> Self {
        Self {
            adapters,
            diagnostics,
            config: OrchestratorConfig::default(),
        }
    }

    /// Privileged then constrained, reporting to the global diagnostics
    #[must_use]
    pub fn from_backend_config(config: &BackendConfig) -> Self {
        let adapters: Vec<Arc<dyn BackendAdapter>> = vec![
            Arc::new(PrivilegedAdapter::new(config)),
            Arc::new(ConstrainedAdapter::new(config)),
        ];
        Self::new(adapters, DiagnosticsState::global())
            .with_config(OrchestratorConfig::new().with_attempt_timeout(config.request_timeout))
    }

    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn adapters(&self) -> &[Arc<dyn BackendAdapter>] {
        &self.adapters
    }

    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<DiagnosticsState> {
        &self.diagnostics
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Whether an adapter of `kind` is present and configured
    #[must_use]
    pub fn has_configured(&self, kind: BackendKind) -> bool {
        self.adapters
            .iter()
            .any(|adapter| adapter.kind() == kind && adapter.is_configured())
    }

    /// Read the stored document from the first adapter that answers
    ///
    /// `NotFound` counts as an answer and yields an empty document.
    ///
    /// # Errors
    /// `StorageUnavailable` carrying every attempt's error when no configured
    /// adapter answers.
    pub async fn get_stored_document(&self) -> Result<StoredDocument, SettingsError> {
        let mut attempts = Vec::new();

        for adapter in self.configured() {
            let kind = adapter.kind();
            let outcome = match self.bounded(kind, adapter.read()).await {
                Err(error) if error.is_not_found() => {
                    tracing::debug!(backend = %kind, "no stored document yet");
                    Ok(StoredDocument::empty())
                }
                other => other,
            };

            match outcome {
                Ok(document) => {
                    self.diagnostics.record_read_attempt(kind, Ok(()));
                    tracing::debug!(backend = %kind, "stored document read");
                    return Ok(document);
                }
                Err(error) => {
                    tracing::warn!(backend = %kind, error = %error, "read attempt failed");
                    self.diagnostics.record_read_attempt(kind, Err(&error));
                    attempts.push(error);
                }
            }
        }

        Err(exhausted(Operation::Read, attempts))
    }

    /// Persist `document` through the first adapter that accepts it
    ///
    /// After a successful write the document is read back, so the returned
    /// value is what storage canonically holds.
    ///
    /// # Errors
    /// `StorageUnavailable` (`Write`) when every configured adapter rejects
    /// the write, or (`Read`) when the confirming read fails.
    pub async fn save_stored_document(&self, document: &StoredDocument) -> Result<StoredDocument, SettingsError> {
        let mut attempts = Vec::new();

        for adapter in self.configured() {
            let kind = adapter.kind();
            match self.bounded(kind, adapter.write(document)).await {
                Ok(()) => {
                    self.diagnostics.record_write_attempt(kind, Ok(()));
                    tracing::info!(backend = %kind, "stored document persisted");
                    return self.get_stored_document().await;
                }
                Err(error) => {
                    tracing::warn!(backend = %kind, error = %error, "write attempt failed");
                    self.diagnostics.record_write_attempt(kind, Err(&error));
                    attempts.push(error);
                }
            }
        }

        Err(exhausted(Operation::Write, attempts))
    }

    fn configured(&self) -> impl Iterator<Item = &Arc<dyn BackendAdapter>> {
        self.adapters.iter().filter(|adapter| {
            let configured = adapter.is_configured();
            if !configured {
                tracing::debug!(backend = %adapter.kind(), "skipping unconfigured backend");
            }
            configured
        })
    }

    async fn bounded<T>(
        &self,
        kind: BackendKind,
        attempt: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let limit = self.config.attempt_timeout;
        tokio::time::timeout(limit, attempt).await.unwrap_or_else(|_| {
            Err(BackendError::unavailable(
                kind,
                format!("attempt timed out after {}ms", limit.as_millis()),
            ))
        })
    }
}

fn exhausted(operation: Operation, attempts: Vec<BackendError>) -> SettingsError {
    let error = SettingsError::StorageUnavailable { operation, attempts };
    tracing::error!(%operation, error = %error, "all storage backends failed");
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerconf_backend::MemoryBackend;
    use layerconf_document::ConfigurationDocument;

    fn orchestrator(backends: &[&MemoryBackend]) -> PersistenceOrchestrator {
        let adapters = backends
            .iter()
            .map(|b| Arc::new((*b).clone()) as Arc<dyn BackendAdapter>)
            .collect();
        PersistenceOrchestrator::new(adapters, Arc::new(DiagnosticsState::new()))
    }

    fn themed(mode: &str) -> StoredDocument {
        StoredDocument {
            org: ConfigurationDocument::new().with("theme", "mode", mode),
            fragments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn first_configured_adapter_wins() {
        let privileged = MemoryBackend::with_document(BackendKind::Privileged, themed("dark"));
        let constrained = MemoryBackend::with_document(BackendKind::Constrained, themed("light"));
        let orch = orchestrator(&[&privileged, &constrained]);

        assert_eq!(orch.get_stored_document().await.unwrap(), themed("dark"));
        assert_eq!(constrained.read_count(), 0);
    }

    #[tokio::test]
    async fn not_found_is_empty_document() {
        let privileged = MemoryBackend::new(BackendKind::Privileged);
        let orch = orchestrator(&[&privileged]);

        assert_eq!(orch.get_stored_document().await.unwrap(), StoredDocument::empty());
        assert!(orch.diagnostics().snapshot().read_errors.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_adapters_are_not_failures() {
        let privileged = MemoryBackend::unconfigured(BackendKind::Privileged);
        let constrained = MemoryBackend::with_document(BackendKind::Constrained, themed("dark"));
        let orch = orchestrator(&[&privileged, &constrained]);

        orch.get_stored_document().await.unwrap();
        assert!(orch.diagnostics().snapshot().read_errors.is_empty());
        assert!(!orch.has_configured(BackendKind::Privileged));
        assert!(orch.has_configured(BackendKind::Constrained));
    }

    #[tokio::test]
    async fn nothing_configured_is_unavailable() {
        let orch = orchestrator(&[&MemoryBackend::unconfigured(BackendKind::Privileged)]);
        let err = orch.get_stored_document().await.unwrap_err();
        assert!(err.is_storage_unavailable());
        assert!(err.attempts().is_empty());
    }

    #[tokio::test]
    async fn write_reads_back_canonical_form() {
        let privileged = MemoryBackend::new(BackendKind::Privileged);
        let orch = orchestrator(&[&privileged]);

        let saved = orch.save_stored_document(&themed("dark")).await.unwrap();
        assert_eq!(saved, themed("dark"));
        assert_eq!(privileged.write_count(), 1);
        assert_eq!(privileged.read_count(), 1);
    }

    #[tokio::test]
    async fn default_order_is_privileged_first() {
        let config = BackendConfig::new()
            .with_endpoint("http://127.0.0.1:9")
            .with_privileged_key("svc")
            .with_session_key("anon");
        let orch = PersistenceOrchestrator::from_backend_config(&config);
        let kinds: Vec<_> = orch.adapters().iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![BackendKind::Privileged, BackendKind::Constrained]);
        assert_eq!(orch.config().attempt_timeout, config.request_timeout);
    }
}
