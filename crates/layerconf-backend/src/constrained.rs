//! Constrained adapter
//!
//! Goes through the database's stored procedures with the session
//! credential, so every call is subject to row-level policy.
//!
//! ```text
//! read:  POST /rest/v1/rpc/{read_fn}  {"p_deployment_id": id}
//! write: POST /rest/v1/rpc/{save_fn}  {"p_deployment_id": id, "p_document": doc}
//! ```
//!
//! The read procedure returns the document or `null` when no row exists.

use crate::adapter::BackendAdapter;
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendKind};
use crate::http::RestClient;
use async_trait::async_trait;
use layerconf_document::StoredDocument;
use serde::Serialize;

const KIND: BackendKind = BackendKind::Constrained;

/// Policy-constrained access through stored procedures
#[derive(Debug, Clone)]
pub struct ConstrainedAdapter {
    client: Option<RestClient>,
    read_fn: String,
    save_fn: String,
    deployment_id: String,
}

#[derive(Serialize)]
struct ReadArgs<'a> {
    p_deployment_id: &'a str,
}

#[derive(Serialize)]
struct SaveArgs<'a> {
    p_deployment_id: &'a str,
    p_document: &'a StoredDocument,
}

impl ConstrainedAdapter {
    /// Build from config; unconfigured if endpoint or session key is missing
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let client = match (&config.endpoint_url, &config.session_key) {
            (Some(endpoint), Some(key)) => RestClient::new(KIND, endpoint, key, config.request_timeout),
            _ => None,
        };
        Self {
            client,
            read_fn: config.read_fn.clone(),
            save_fn: config.save_fn.clone(),
            deployment_id: config.deployment_id.clone(),
        }
    }

    fn client(&self) -> Result<&RestClient, BackendError> {
        self.client
            .as_ref()
            .ok_or_else(|| BackendError::unavailable(KIND, "endpoint or session credential not configured"))
    }
}

#[async_trait]
impl BackendAdapter for ConstrainedAdapter {
    fn kind(&self) -> BackendKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn read(&self) -> Result<StoredDocument, BackendError> {
        let client = self.client()?;
        let request = client
            .post(&format!("rpc/{}", self.read_fn))
            .json(&ReadArgs {
                p_deployment_id: &self.deployment_id,
            });

        let response = client.send(request).await?;
        let document: Option<serde_json::Value> = client.json(response).await?;
        let document = document.ok_or(BackendError::NotFound { backend: KIND })?;
        client.stored_document(document)
    }

    async fn write(&self, document: &StoredDocument) -> Result<(), BackendError> {
        let client = self.client()?;
        let request = client
            .post(&format!("rpc/{}", self.save_fn))
            .json(&SaveArgs {
                p_deployment_id: &self.deployment_id,
                p_document: document,
            });

        client.send(request).await?;
        tracing::debug!(backend = %KIND, procedure = %self.save_fn, "stored document saved");
        Ok(())
    }
}
