//! Orchestrator fallback, diagnostics and service behaviour over fake backends

use layerconf_backend::{BackendAdapter, BackendError, BackendKind, MemoryBackend};
use layerconf_core::{DataSource, Operation, SettingsError, WriteRequest};
use layerconf_document::{ConfigurationDocument, ResolutionContext, ScopeKey, ScopeType, StoredDocument};
use layerconf_test_utils::{
    full_context, orchestrator, scenario_stored, slot, slot_minutes, unavailable, ScriptedBackend, TestHarness,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn falls_back_to_constrained_without_privileged_credential() {
    let harness = TestHarness::constrained_only();
    harness.constrained.set_document(scenario_stored());

    let resolution = harness.service.effective(&full_context()).await.unwrap();
    assert_eq!(slot_minutes(&resolution.effective), Some(5));

    let record = harness.diagnostics.snapshot();
    assert_eq!(record.last_read_source, DataSource::Constrained);
    assert!(record.read_errors.is_empty());
}

#[tokio::test]
async fn falls_back_when_privileged_read_fails() {
    let harness = TestHarness::new();
    harness.privileged.set_document(scenario_stored());
    harness.privileged.fail_reads(unavailable(BackendKind::Privileged));

    let stored = harness.service.stored().await.unwrap();
    assert_eq!(stored, scenario_stored());

    let record = harness.diagnostics.snapshot();
    assert_eq!(record.last_read_source, DataSource::Constrained);
    assert_eq!(record.read_errors.len(), 1);
    assert_eq!(record.read_errors[0].backend, BackendKind::Privileged);
}

#[tokio::test]
async fn both_reads_fail_is_storage_unavailable() {
    let harness = TestHarness::new();
    harness.privileged.fail_reads(unavailable(BackendKind::Privileged));
    harness
        .constrained
        .fail_reads(BackendError::permission_denied(BackendKind::Constrained, "row policy"));

    let err = harness.service.effective(&ResolutionContext::new()).await.unwrap_err();
    let SettingsError::StorageUnavailable { operation, attempts } = &err else {
        panic!("expected StorageUnavailable, got {err:?}");
    };
    assert_eq!(*operation, Operation::Read);
    assert_eq!(attempts.len(), 2);
    assert!(err.to_string().contains("privileged"));
    assert!(err.to_string().contains("row policy"));

    let record = harness.diagnostics.snapshot();
    let backends: Vec<_> = record.read_errors.iter().map(|e| e.backend).collect();
    assert_eq!(backends, vec![BackendKind::Privileged, BackendKind::Constrained]);
    assert_eq!(record.last_read_source, DataSource::Unknown);
}

#[tokio::test]
async fn privileged_write_is_confirmed_by_read() {
    let harness = TestHarness::new();
    let request = WriteRequest::new(ScopeKey::scoped(ScopeType::User, "u1").unwrap(), slot(45));

    let outcome = harness.service.write(&request).await.unwrap();
    assert_eq!(slot_minutes(&outcome.effective), Some(45));
    assert_eq!(harness.diagnostics.snapshot().last_persist_target, DataSource::Privileged);

    let ctx = ResolutionContext::new().with_user("u1");
    let resolution = harness.service.effective(&ctx).await.unwrap();
    assert_eq!(slot_minutes(&resolution.effective), Some(45));
    assert_eq!(harness.privileged.document(), Some(outcome.stored));
}

#[tokio::test]
async fn write_falls_back_to_constrained() {
    let harness = TestHarness::new();
    harness.privileged.fail_writes(BackendError::conflict(BackendKind::Privileged, "duplicate"));

    let request = WriteRequest::new(ScopeKey::org(), ConfigurationDocument::new().with("theme", "mode", "dark"));
    harness.service.write(&request).await.unwrap();

    let record = harness.diagnostics.snapshot();
    assert_eq!(record.last_persist_target, DataSource::Constrained);
    assert!(record.write_error.is_none());
    assert_eq!(harness.constrained.write_count(), 1);
}

#[tokio::test]
async fn total_write_failure_is_never_silent() {
    let privileged = MemoryBackend::with_document(BackendKind::Privileged, scenario_stored());
    let constrained = MemoryBackend::with_document(BackendKind::Constrained, scenario_stored());
    privileged.fail_writes(unavailable(BackendKind::Privileged));
    constrained.fail_writes(BackendError::permission_denied(BackendKind::Constrained, "row policy"));
    let harness = TestHarness::with_backends(privileged, constrained);

    let request = WriteRequest::new(ScopeKey::scoped(ScopeType::Device, "ipadA").unwrap(), slot(15));
    let err = harness.service.write(&request).await.unwrap_err();
    assert!(matches!(
        err,
        SettingsError::StorageUnavailable { operation: Operation::Write, ref attempts } if attempts.len() == 2
    ));

    let record = harness.diagnostics.snapshot();
    let write_error = record.write_error.expect("write error recorded");
    assert_eq!(write_error.backend, BackendKind::Constrained);
    assert_eq!(record.last_persist_target, DataSource::Unknown);
    assert_eq!(harness.privileged.document(), Some(scenario_stored()));
}

#[tokio::test]
async fn write_error_cleared_after_recovery() {
    let harness = TestHarness::new();
    harness.privileged.fail_writes(unavailable(BackendKind::Privileged));
    harness.constrained.fail_writes(unavailable(BackendKind::Constrained));
    let request = WriteRequest::new(ScopeKey::org(), slot(25));
    assert!(harness.service.write(&request).await.is_err());

    harness.privileged.clear_failures();
    harness.service.write(&request).await.unwrap();
    assert!(harness.diagnostics.snapshot().write_error.is_none());
}

#[tokio::test]
async fn stalled_backend_is_cut_off_and_skipped() {
    let slow = ScriptedBackend::new(BackendKind::Privileged)
        .with_delay(Duration::from_secs(30))
        .then_read(Ok(StoredDocument::empty()));
    let healthy = ScriptedBackend::new(BackendKind::Constrained).then_read(Ok(scenario_stored()));
    let adapters: Vec<Arc<dyn BackendAdapter>> = vec![Arc::new(slow), Arc::new(healthy)];
    let orch = orchestrator(adapters, Duration::from_millis(50));

    let stored = orch.get_stored_document().await.unwrap();
    assert_eq!(stored, scenario_stored());

    let record = orch.diagnostics().snapshot();
    assert_eq!(record.last_read_source, DataSource::Constrained);
    assert!(record.read_errors[0].message.contains("timed out"));
}

#[tokio::test]
async fn confirming_read_failure_surfaces_as_read_error() {
    let writer = Arc::new(
        ScriptedBackend::new(BackendKind::Privileged)
            .then_write(Ok(()))
            .then_read(Err(unavailable(BackendKind::Privileged))),
    );
    let adapters: Vec<Arc<dyn BackendAdapter>> = vec![writer.clone()];
    let orch = orchestrator(adapters, Duration::from_secs(1));

    let err = orch.save_stored_document(&scenario_stored()).await.unwrap_err();
    assert!(matches!(err, SettingsError::StorageUnavailable { operation: Operation::Read, .. }));
    assert_eq!(writer.written(), vec![scenario_stored()]);
    assert_eq!(orch.diagnostics().snapshot().last_persist_target, DataSource::Privileged);
}

#[tokio::test]
async fn scenario_precedence_through_service() {
    let harness = TestHarness::new();
    harness.privileged.set_document(scenario_stored());

    let full = harness.service.effective(&full_context()).await.unwrap();
    assert_eq!(slot_minutes(&full.effective), Some(5));

    let partial = ResolutionContext::new().with_location("loc1").with_role("Groomer");
    let partial = harness.service.effective(&partial).await.unwrap();
    assert_eq!(slot_minutes(&partial.effective), Some(20));

    let none = harness.service.effective(&ResolutionContext::new()).await.unwrap();
    assert_eq!(slot_minutes(&none.effective), Some(30));
}

#[tokio::test]
async fn empty_storage_resolves_to_defaults() {
    let harness = TestHarness::new();
    let resolution = harness.service.effective(&full_context()).await.unwrap();
    assert_eq!(resolution.effective.as_document(), harness.service.defaults().defaults());
}

#[tokio::test]
async fn merge_write_keeps_siblings_and_replace_drops_them() {
    let harness = TestHarness::new();
    let scope = ScopeKey::scoped(ScopeType::Location, "loc1").unwrap();
    let first = ConfigurationDocument::new()
        .with("scheduling", "slotMinutes", 10)
        .with("scheduling", "openHour", 8);
    harness.service.write(&WriteRequest::new(scope.clone(), first)).await.unwrap();

    let merged = harness
        .service
        .write(&WriteRequest::new(scope.clone(), slot(15)))
        .await
        .unwrap();
    assert_eq!(slot_minutes(&merged.effective), Some(15));
    assert_eq!(merged.effective.get("scheduling", "openHour").and_then(|v| v.as_i64()), Some(8));

    let replaced = harness
        .service
        .write(&WriteRequest::new(scope, slot(20)).replacing())
        .await
        .unwrap();
    assert_eq!(slot_minutes(&replaced.effective), Some(20));
    assert_eq!(replaced.effective.get("scheduling", "openHour").and_then(|v| v.as_i64()), Some(9));
}

#[tokio::test]
async fn write_with_unknown_keys_is_stored_but_warned() {
    let harness = TestHarness::new();
    let patch = ConfigurationDocument::new()
        .with("scheduling", "slotMinutes", "ten")
        .with("scheduling", "nonsense", true);
    let outcome = harness.service.write(&WriteRequest::new(ScopeKey::org(), patch)).await.unwrap();

    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(slot_minutes(&outcome.effective), Some(30));
    assert!(outcome.stored.org.get("scheduling", "nonsense").is_some());
}

#[tokio::test]
async fn health_reads_lazily_and_reports_mode() {
    let harness = TestHarness::new();
    let report = harness.service.health().await;
    assert_eq!(report.mode, BackendKind::Privileged);
    assert_eq!(report.last_read_source, DataSource::Privileged);
    assert_eq!(harness.privileged.read_count(), 1);

    harness.service.health().await;
    assert_eq!(harness.privileged.read_count(), 1);

    let constrained = TestHarness::constrained_only();
    let report = constrained.service.health().await;
    assert_eq!(report.mode, BackendKind::Constrained);
    assert!(!report.env.privileged_credential);
    assert_eq!(report.last_read_source, DataSource::Constrained);
}

#[tokio::test]
async fn health_reports_failures_without_erroring() {
    let harness = TestHarness::new();
    harness.privileged.fail_reads(unavailable(BackendKind::Privileged));
    harness.constrained.fail_reads(unavailable(BackendKind::Constrained));

    let report = harness.service.health().await;
    assert_eq!(report.last_read_source, DataSource::Unknown);
    assert_eq!(report.read_errors.len(), 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["mode"], "privileged");
    assert_eq!(json["readErrors"][0]["backend"], "privileged");
    assert!(json["readErrors"][0]["timestamp"].is_string());
    assert!(json["env"]["constrainedCredential"].as_bool().unwrap());
}

#[tokio::test]
async fn repeated_health_does_not_grow_read_errors() {
    let harness = TestHarness::new();
    harness.privileged.fail_reads(unavailable(BackendKind::Privileged));
    harness.constrained.fail_reads(unavailable(BackendKind::Constrained));

    for _ in 0..5 {
        let report = harness.service.health().await;
        assert_eq!(report.read_errors.len(), 2);
    }
    assert_eq!(harness.privileged.read_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_record_every_attempt() {
    let privileged = MemoryBackend::new(BackendKind::Privileged);
    privileged.fail_reads(unavailable(BackendKind::Privileged));
    let constrained = privileged.sharing(BackendKind::Constrained);
    constrained.set_document(scenario_stored());
    let adapters: Vec<Arc<dyn BackendAdapter>> = vec![Arc::new(privileged), Arc::new(constrained)];
    let orch = Arc::new(orchestrator(adapters, Duration::from_secs(1)));

    let tasks: Vec<_> = (0..48)
        .map(|_| {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_stored_document().await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), scenario_stored());
    }

    let record = orch.diagnostics().snapshot();
    assert_eq!(record.read_errors.len(), 48);
    assert!(record.read_errors.iter().all(|e| e.backend == BackendKind::Privileged));
    assert_eq!(record.last_read_source, DataSource::Constrained);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolution_over_shared_storage() {
    let harness = TestHarness::new();
    harness.privileged.set_document(scenario_stored());
    let contexts = [
        (full_context(), 5),
        (ResolutionContext::new().with_location("loc1").with_role("Groomer"), 20),
        (ResolutionContext::new().with_location("loc1"), 10),
        (ResolutionContext::new(), 30),
    ];

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let service = harness.service.clone();
            let (context, expected) = contexts[i % contexts.len()].clone();
            tokio::spawn(async move {
                let resolution = service.effective(&context).await.unwrap();
                (slot_minutes(&resolution.effective), expected)
            })
        })
        .collect();
    for task in tasks {
        let (actual, expected) = task.await.unwrap();
        assert_eq!(actual, Some(expected));
    }
    assert_eq!(harness.diagnostics.snapshot().read_errors.len(), 0);
}

#[tokio::test]
async fn padded_scope_id_matches_plain_context() {
    let harness = TestHarness::new();
    let patch: serde_json::Value = serde_json::json!({
        "scope": {"type": "location", "id": " loc1 "},
        "settings": {"scheduling": {"slotMinutes": 12}},
    });
    harness.service.write(&WriteRequest::from_json(patch).unwrap()).await.unwrap();

    let resolution = harness
        .service
        .effective(&ResolutionContext::new().with_location("loc1"))
        .await
        .unwrap();
    assert_eq!(slot_minutes(&resolution.effective), Some(12));
}
