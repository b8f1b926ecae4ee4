//! Settings service
//!
//! Ties the pieces together for one request: read the stored document through
//! the orchestrator, resolve it against the defaults, and for writes apply the
//! patch, persist it and resolve the confirmed result.
//!
//! Writes are read-modify-write against storage without a service-side lock.
//! Two concurrent writes to different scopes can race; the later one wins.

use crate::diagnostics::{DataSource, ErrorEntry};
use crate::error::SettingsError;
use crate::orchestrator::PersistenceOrchestrator;
use layerconf_backend::{BackendConfig, BackendKind, EnvPresence};
use layerconf_document::{
    ConfigurationDocument, DefaultsProvider, ResolutionContext, ScopeKey, ScopeType, StoredDocument,
};
use layerconf_resolve::{EffectiveConfiguration, Resolution, ResolutionEngine, SchemaViolation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One scoped write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    /// Target scope
    pub scope: ScopeKey,
    /// Partial document deep-merged into the scope's fragment
    pub settings: ConfigurationDocument,
    /// Replace the scope's fragment instead of merging into it
    pub replace: bool,
    /// Context used to resolve the response; defaults to the target scope
    pub context: Option<ResolutionContext>,
}

#[derive(Deserialize)]
struct RawScope {
    #[serde(rename = "type")]
    scope_type: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct RawWrite {
    scope: RawScope,
    #[serde(default)]
    settings: Option<Value>,
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    context: Option<ResolutionContext>,
}

impl WriteRequest {
    #[must_use]
    pub fn new(scope: ScopeKey, settings: ConfigurationDocument) -> Self {
        Self {
            scope,
            settings,
            replace: false,
            context: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: ResolutionContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Parse a JSON write body
    ///
    /// `{"scope": {"type": "user", "id": "u1"}, "settings": {...}, "replace": false}`
    ///
    /// # Errors
    /// `InvalidScope` for a bad scope, `InvalidRequest` for anything else.
    pub fn from_json(body: Value) -> Result<Self, SettingsError> {
        let raw: RawWrite =
            serde_json::from_value(body).map_err(|e| SettingsError::InvalidRequest(e.to_string()))?;

        let scope_type: ScopeType = raw.scope.scope_type.parse()?;
        let scope = ScopeKey::new(scope_type, raw.scope.id)?;
        let settings = match raw.settings {
            Some(value) => ConfigurationDocument::try_from(value)
                .map_err(|e| SettingsError::InvalidRequest(e.to_string()))?,
            None => ConfigurationDocument::new(),
        };

        Ok(Self {
            scope,
            settings,
            replace: raw.replace,
            context: raw.context,
        })
    }

    fn resolution_context(&self) -> ResolutionContext {
        self.context
            .clone()
            .unwrap_or_else(|| ResolutionContext::for_scope(&self.scope))
    }
}

/// Confirmed result of a write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteOutcome {
    /// Stored document as read back after the write
    pub stored: StoredDocument,
    pub effective: EffectiveConfiguration,
    pub warnings: Vec<SchemaViolation>,
}

/// Health endpoint body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `privileged` when the privileged adapter is usable
    pub mode: BackendKind,
    pub env: EnvPresence,
    pub last_read_source: DataSource,
    pub last_persist_target: DataSource,
    pub read_errors: Vec<ErrorEntry>,
    pub write_error: Option<ErrorEntry>,
}

/// Read, write and health operations over stored settings
#[derive(Debug, Clone)]
pub struct SettingsService {
    orchestrator: PersistenceOrchestrator,
    defaults: DefaultsProvider,
    engine: ResolutionEngine,
    env: EnvPresence,
}

impl SettingsService {
    #[must_use]
    pub fn new(orchestrator: PersistenceOrchestrator, defaults: DefaultsProvider, env: EnvPresence) -> Self {
        Self {
            orchestrator,
            defaults,
            engine: ResolutionEngine::new(),
            env,
        }
    }

    /// Service over the HTTP adapters with built-in defaults
    #[must_use]
    pub fn from_backend_config(config: &BackendConfig) -> Self {
        Self::new(
            PersistenceOrchestrator::from_backend_config(config),
            DefaultsProvider::builtin(),
            config.presence(),
        )
    }

    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &PersistenceOrchestrator {
        &self.orchestrator
    }

    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &DefaultsProvider {
        &self.defaults
    }

    #[must_use]
    pub fn mode(&self) -> BackendKind {
        if self.orchestrator.has_configured(BackendKind::Privileged) {
            BackendKind::Privileged
        } else {
            BackendKind::Constrained
        }
    }

    /// Raw stored document
    ///
    /// # Errors
    /// `StorageUnavailable` when no backend answers.
    pub async fn stored(&self) -> Result<StoredDocument, SettingsError> {
        self.orchestrator.get_stored_document().await
    }

    /// Effective configuration for `context`
    ///
    /// # Errors
    /// `StorageUnavailable` when no backend answers. Never falls back to the
    /// bare defaults.
    pub async fn effective(&self, context: &ResolutionContext) -> Result<Resolution, SettingsError> {
        let stored = self.orchestrator.get_stored_document().await?;
        Ok(self.engine.resolve_stored(&self.defaults, &stored, context))
    }

    /// Apply one scoped write and return the confirmed state
    ///
    /// # Errors
    /// `StorageUnavailable` when the current document cannot be read, the
    /// write is rejected everywhere, or the confirming read fails.
    pub async fn write(&self, request: &WriteRequest) -> Result<WriteOutcome, SettingsError> {
        let current = self.orchestrator.get_stored_document().await?;
        let next = current.with_write(&request.scope, &request.settings, request.replace);
        let stored = self.orchestrator.save_stored_document(&next).await?;

        let resolution = self
            .engine
            .resolve_stored(&self.defaults, &stored, &request.resolution_context());
        tracing::info!(scope = %request.scope, replace = request.replace, "settings written");

        Ok(WriteOutcome {
            stored,
            effective: resolution.effective,
            warnings: resolution.warnings,
        })
    }

    /// Diagnostics snapshot, reading once first if no read was ever attempted
    ///
    /// A failed first read is not repeated, so polling health while storage is
    /// down does not keep appending read errors.
    pub async fn health(&self) -> HealthReport {
        let diagnostics = self.orchestrator.diagnostics();
        if !diagnostics.read_attempted() {
            if let Err(error) = self.orchestrator.get_stored_document().await {
                tracing::debug!(error = %error, "initial health read failed");
            }
        }

        let record = diagnostics.snapshot();
        HealthReport {
            mode: self.mode(),
            env: self.env,
            last_read_source: record.last_read_source,
            last_persist_target: record.last_persist_target,
            read_errors: record.read_errors,
            write_error: record.write_error,
        }
    }
}
