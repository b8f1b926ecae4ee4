//! Testing utilities for the layerconf workspace
//!
//! Shared fixtures, a scripted fake backend, and a ready-wired service over
//! in-memory backends.

#![allow(missing_docs)]

use async_trait::async_trait;
use layerconf_backend::{BackendAdapter, BackendError, BackendKind, EnvPresence, MemoryBackend};
use layerconf_core::{DiagnosticsState, OrchestratorConfig, PersistenceOrchestrator, SettingsService};
use layerconf_document::{
    ConfigurationDocument, DefaultsProvider, ResolutionContext, ScopeFragment, ScopeType, StoredDocument,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// `{"scheduling": {"slotMinutes": minutes}}`
pub fn slot(minutes: i64) -> ConfigurationDocument {
    ConfigurationDocument::new().with("scheduling", "slotMinutes", minutes)
}

pub fn fragment(layer: ScopeType, id: &str, settings: ConfigurationDocument) -> ScopeFragment {
    ScopeFragment::scoped(layer, id, settings).unwrap()
}

/// location/loc1=10, role/Groomer=20, user/u1=30, device/ipadA=5
pub fn scenario_fragments() -> Vec<ScopeFragment> {
    vec![
        fragment(ScopeType::Location, "loc1", slot(10)),
        fragment(ScopeType::Role, "Groomer", slot(20)),
        fragment(ScopeType::User, "u1", slot(30)),
        fragment(ScopeType::Device, "ipadA", slot(5)),
    ]
}

pub fn scenario_stored() -> StoredDocument {
    StoredDocument {
        org: ConfigurationDocument::new(),
        fragments: scenario_fragments(),
    }
}

/// Context selecting every scenario fragment
pub fn full_context() -> ResolutionContext {
    ResolutionContext::new()
        .with_location("loc1")
        .with_role("Groomer")
        .with_user("u1")
        .with_device("ipadA")
}

pub fn slot_minutes(document: &ConfigurationDocument) -> Option<i64> {
    document.get("scheduling", "slotMinutes").and_then(|v| v.as_i64())
}

pub fn unavailable(kind: BackendKind) -> BackendError {
    BackendError::unavailable(kind, "connection refused")
}

/// Fake adapter answering from per-operation scripts
///
/// Each call pops the next scripted result; an exhausted read script answers
/// `NotFound`, an exhausted write script answers `Ok`. An optional delay is
/// applied before every answer.
#[derive(Debug)]
pub struct ScriptedBackend {
    kind: BackendKind,
    delay: Option<Duration>,
    reads: Mutex<VecDeque<Result<StoredDocument, BackendError>>>,
    writes: Mutex<VecDeque<Result<(), BackendError>>>,
    written: Mutex<Vec<StoredDocument>>,
}

impl ScriptedBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            delay: None,
            reads: Mutex::new(VecDeque::new()),
            writes: Mutex::new(VecDeque::new()),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then_read(self, result: Result<StoredDocument, BackendError>) -> Self {
        self.reads.lock().push_back(result);
        self
    }

    pub fn then_write(self, result: Result<(), BackendError>) -> Self {
        self.writes.lock().push_back(result);
        self
    }

    /// Documents passed to successful writes
    pub fn written(&self) -> Vec<StoredDocument> {
        self.written.lock().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl BackendAdapter for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn read(&self) -> Result<StoredDocument, BackendError> {
        self.pause().await;
        self.reads
            .lock()
            .pop_front()
            .unwrap_or(Err(BackendError::NotFound { backend: self.kind }))
    }

    async fn write(&self, document: &StoredDocument) -> Result<(), BackendError> {
        self.pause().await;
        let result = self.writes.lock().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.written.lock().push(document.clone());
        }
        result
    }
}

/// Service over a privileged and a constrained [`MemoryBackend`]
///
/// The backend handles share state with the adapters inside the service, so
/// tests can seed, sabotage and inspect storage directly.
pub struct TestHarness {
    pub privileged: MemoryBackend,
    pub constrained: MemoryBackend,
    pub diagnostics: Arc<DiagnosticsState>,
    pub service: SettingsService,
}

impl TestHarness {
    /// Both backends configured, two paths onto one stored row
    pub fn new() -> Self {
        let privileged = MemoryBackend::new(BackendKind::Privileged);
        Self::build(privileged.clone(), privileged.sharing(BackendKind::Constrained))
    }

    /// Privileged credential absent
    pub fn constrained_only() -> Self {
        Self::build(
            MemoryBackend::unconfigured(BackendKind::Privileged),
            MemoryBackend::new(BackendKind::Constrained),
        )
    }

    /// Independent backends with the given contents
    pub fn with_backends(privileged: MemoryBackend, constrained: MemoryBackend) -> Self {
        Self::build(privileged, constrained)
    }

    fn build(privileged: MemoryBackend, constrained: MemoryBackend) -> Self {
        let diagnostics = Arc::new(DiagnosticsState::new());
        let adapters: Vec<Arc<dyn BackendAdapter>> =
            vec![Arc::new(privileged.clone()), Arc::new(constrained.clone())];
        let orchestrator = PersistenceOrchestrator::new(adapters, Arc::clone(&diagnostics))
            .with_config(OrchestratorConfig::new().with_attempt_timeout(Duration::from_secs(1)));
        let env = EnvPresence {
            endpoint_url: false,
            privileged_credential: privileged.is_configured(),
            constrained_credential: constrained.is_configured(),
        };
        let service = SettingsService::new(orchestrator, DefaultsProvider::builtin(), env);

        Self {
            privileged,
            constrained,
            diagnostics,
            service,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrator over arbitrary adapters with a private diagnostics instance
pub fn orchestrator(adapters: Vec<Arc<dyn BackendAdapter>>, attempt_timeout: Duration) -> PersistenceOrchestrator {
    PersistenceOrchestrator::new(adapters, Arc::new(DiagnosticsState::new()))
        .with_config(OrchestratorConfig::new().with_attempt_timeout(attempt_timeout))
}
