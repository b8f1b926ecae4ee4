//! Privileged adapter
//!
//! Reads and writes the settings table row directly with the elevated
//! credential, bypassing row-level policy.
//!
//! ```text
//! read:  GET  /rest/v1/{table}?deployment_id=eq.{id}&select=document
//! write: POST /rest/v1/{table}?on_conflict=deployment_id   (upsert)
//! ```

use crate::adapter::BackendAdapter;
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendKind};
use crate::http::RestClient;
use async_trait::async_trait;
use layerconf_document::StoredDocument;
use serde::{Deserialize, Serialize};

const KIND: BackendKind = BackendKind::Privileged;

/// Direct table access with the elevated credential
#[derive(Debug, Clone)]
pub struct PrivilegedAdapter {
    client: Option<RestClient>,
    table: String,
    deployment_id: String,
}

#[derive(Deserialize)]
struct SettingsRow {
    document: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct SettingsUpsert<'a> {
    deployment_id: &'a str,
    document: &'a StoredDocument,
}

impl PrivilegedAdapter {
    /// Build from config; unconfigured if endpoint or privileged key is missing
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let client = match (&config.endpoint_url, &config.privileged_key) {
            (Some(endpoint), Some(key)) => RestClient::new(KIND, endpoint, key, config.request_timeout),
            _ => None,
        };
        Self {
            client,
            table: config.table.clone(),
            deployment_id: config.deployment_id.clone(),
        }
    }

    fn client(&self) -> Result<&RestClient, BackendError> {
        self.client
            .as_ref()
            .ok_or_else(|| BackendError::unavailable(KIND, "endpoint or privileged credential not configured"))
    }
}

#[async_trait]
impl BackendAdapter for PrivilegedAdapter {
    fn kind(&self) -> BackendKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn read(&self) -> Result<StoredDocument, BackendError> {
        let client = self.client()?;
        let request = client.get(&self.table).query(&[
            ("deployment_id", format!("eq.{}", self.deployment_id)),
            ("select", "document".to_string()),
        ]);

        let response = client.send(request).await?;
        let rows: Vec<SettingsRow> = client.json(response).await?;
        let document = rows
            .into_iter()
            .next()
            .and_then(|row| row.document)
            .ok_or(BackendError::NotFound { backend: KIND })?;
        client.stored_document(document)
    }

    async fn write(&self, document: &StoredDocument) -> Result<(), BackendError> {
        let client = self.client()?;
        let body = [SettingsUpsert {
            deployment_id: &self.deployment_id,
            document,
        }];
        let request = client
            .post(&self.table)
            .query(&[("on_conflict", "deployment_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&body);

        client.send(request).await?;
        tracing::debug!(backend = %KIND, table = %self.table, "stored document upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_fails_fast() {
        let adapter = PrivilegedAdapter::new(&BackendConfig::new().with_endpoint("http://127.0.0.1:9"));
        assert!(!adapter.is_configured());

        let err = adapter.read().await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { backend: BackendKind::Privileged, .. }));

        let err = adapter.write(&StoredDocument::empty()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { .. }));
    }

    #[test]
    fn configured_with_endpoint_and_key() {
        let config = BackendConfig::new()
            .with_endpoint("http://127.0.0.1:9")
            .with_privileged_key("service");
        assert!(PrivilegedAdapter::new(&config).is_configured());
    }
}
