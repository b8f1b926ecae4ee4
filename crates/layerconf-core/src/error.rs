//! Error types for the settings service
//!
//! Per-attempt adapter failures never surface directly: the orchestrator
//! collects them and only reports [`SettingsError::StorageUnavailable`] once
//! every configured backend has been tried.

use layerconf_backend::BackendError;
use layerconf_document::DocumentError;
use serde::Serialize;
use std::fmt;

/// Persistence operation that was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Settings service error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Every configured backend failed
    #[error("settings storage unavailable ({operation}): {}", summarize(.attempts))]
    StorageUnavailable {
        operation: Operation,
        /// One error per attempted backend, in attempt order
        attempts: Vec<BackendError>,
    },

    /// Write targeted an invalid scope
    #[error("invalid scope: {0}")]
    InvalidScope(#[from] DocumentError),

    /// Write body could not be interpreted
    #[error("invalid write request: {0}")]
    InvalidRequest(String),
}

impl SettingsError {
    #[inline]
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Whether the caller sent something unusable
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidScope(_) | Self::InvalidRequest(_))
    }

    /// Per-backend failures behind a `StorageUnavailable`
    #[must_use]
    pub fn attempts(&self) -> &[BackendError] {
        match self {
            Self::StorageUnavailable { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

fn summarize(attempts: &[BackendError]) -> String {
    if attempts.is_empty() {
        return "no storage backend configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
