//! Service wiring for the binary

use layerconf_backend::{BackendAdapter, BackendConfig, BackendKind, MemoryBackend};
use layerconf_core::{DiagnosticsState, OrchestratorConfig, PersistenceOrchestrator, SettingsService};
use layerconf_document::DefaultsProvider;
use std::sync::Arc;

/// Where stored settings live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Hosted gateway through the privileged and constrained adapters
    Remote,
    /// Process-local row, lost on exit
    Memory,
}

/// Build the settings service for `mode`
#[must_use]
pub fn build_service(config: &BackendConfig, mode: StorageMode) -> SettingsService {
    match mode {
        StorageMode::Remote => SettingsService::from_backend_config(config),
        StorageMode::Memory => {
            let privileged = MemoryBackend::new(BackendKind::Privileged);
            let constrained = privileged.sharing(BackendKind::Constrained);
            let adapters: Vec<Arc<dyn BackendAdapter>> = vec![Arc::new(privileged), Arc::new(constrained)];
            let orchestrator = PersistenceOrchestrator::new(adapters, DiagnosticsState::global())
                .with_config(OrchestratorConfig::new().with_attempt_timeout(config.request_timeout));
            SettingsService::new(orchestrator, DefaultsProvider::builtin(), config.presence())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_mode_is_privileged() {
        let service = build_service(&BackendConfig::new(), StorageMode::Memory);
        assert_eq!(service.mode(), BackendKind::Privileged);
    }

    #[test]
    fn remote_mode_without_service_key_is_constrained() {
        let config = BackendConfig::new()
            .with_endpoint("http://127.0.0.1:9")
            .with_session_key("anon");
        let service = build_service(&config, StorageMode::Remote);
        assert_eq!(service.mode(), BackendKind::Constrained);
    }
}
