//! Shared REST transport for the hosted database gateway
//!
//! Both HTTP adapters talk to the same gateway; they differ in credential and
//! in which resource they hit (table vs. procedure). Status mapping:
//!
//! | status        | error              |
//! |---------------|--------------------|
//! | 401, 403      | `PermissionDenied` |
//! | 404           | `NotFound`         |
//! | 409           | `Conflict`         |
//! | anything else | `Unavailable`      |

use crate::error::{BackendError, BackendKind};
use layerconf_document::StoredDocument;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    client: Client,
    base_url: String,
    backend: BackendKind,
    credential: String,
    timeout: Duration,
}

impl RestClient {
    /// Build a client; `None` if the HTTP client itself cannot be created
    pub(crate) fn new(
        backend: BackendKind,
        endpoint: &str,
        credential: &str,
        timeout: Duration,
    ) -> Option<Self> {
        match Client::builder().timeout(timeout).build() {
            Ok(client) => Some(Self {
                client,
                base_url: endpoint.trim_end_matches('/').to_string(),
                backend,
                credential: credential.to_string(),
                timeout,
            }),
            Err(e) => {
                tracing::warn!(backend = %backend, error = %e, "failed to build http client");
                None
            }
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.credential)
            .bearer_auth(&self.credential)
            .header("Accept", "application/json")
    }

    /// Send and map non-success statuses to the adapter taxonomy
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status(self.backend, status, &body))
    }

    /// Decode a JSON body
    pub(crate) async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T, BackendError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::unavailable(self.backend, format!("malformed response body: {e}")))
    }

    /// Decode a stored document row, skipping corrupt fragments and entries
    ///
    /// Only a row that is not an object at all is an error.
    pub(crate) fn stored_document(&self, value: serde_json::Value) -> Result<StoredDocument, BackendError> {
        decode_stored(self.backend, value)
    }

    fn transport_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::unavailable(
                self.backend,
                format!("request timed out after {}ms", self.timeout.as_millis()),
            )
        } else {
            BackendError::unavailable(self.backend, error.to_string())
        }
    }
}

pub(crate) fn decode_stored(backend: BackendKind, value: serde_json::Value) -> Result<StoredDocument, BackendError> {
    let decoded = StoredDocument::from_json_lenient(value)
        .map_err(|e| BackendError::unavailable(backend, format!("malformed stored document: {e}")))?;
    for dropped in &decoded.dropped {
        tracing::warn!(backend = %backend, reason = %dropped, "ignoring corrupt stored entry");
    }
    Ok(decoded.document)
}

pub(crate) fn map_status(backend: BackendKind, status: StatusCode, body: &str) -> BackendError {
    let message = format!("http {}: {}", status.as_u16(), truncate(body.trim()));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::permission_denied(backend, message),
        StatusCode::NOT_FOUND => BackendError::NotFound { backend },
        StatusCode::CONFLICT => BackendError::conflict(backend, message),
        _ => BackendError::unavailable(backend, message),
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
