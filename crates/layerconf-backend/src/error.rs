//! Error types for storage adapters
//!
//! Provides:
//! - [`BackendKind`]: which storage path an error or attempt belongs to
//! - [`BackendError`]: the adapter contract's failure taxonomy
//! - [`ConfigError`]: invalid environment configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a storage path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Elevated credential, bypasses row-level policy
    Privileged,
    /// Caller's session credential, subject to row-level policy
    Constrained,
}

impl BackendKind {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Privileged => "privileged",
            Self::Constrained => "constrained",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Unreachable, timed out, misconfigured, or returned garbage
    #[error("{backend} backend unavailable: {message}")]
    Unavailable { backend: BackendKind, message: String },

    /// Rejected by the storage layer's access policy
    #[error("{backend} backend denied access: {message}")]
    PermissionDenied { backend: BackendKind, message: String },

    /// No stored document exists yet (read only)
    #[error("{backend} backend has no stored document")]
    NotFound { backend: BackendKind },

    /// Write rejected by a storage-level constraint
    #[error("{backend} backend rejected write: {message}")]
    Conflict { backend: BackendKind, message: String },
}

impl BackendError {
    #[inline]
    pub fn unavailable(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend,
            message: message.into(),
        }
    }

    #[inline]
    pub fn permission_denied(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            backend,
            message: message.into(),
        }
    }

    #[inline]
    pub fn conflict(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::Conflict {
            backend,
            message: message.into(),
        }
    }

    /// Backend that produced the error
    #[inline]
    #[must_use]
    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Unavailable { backend, .. }
            | Self::PermissionDenied { backend, .. }
            | Self::NotFound { backend }
            | Self::Conflict { backend, .. } => *backend,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Invalid configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable present but unparsable
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },
}

impl ConfigError {
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_backend() {
        let err = BackendError::unavailable(BackendKind::Privileged, "connection refused");
        assert_eq!(err.to_string(), "privileged backend unavailable: connection refused");

        let err = BackendError::NotFound { backend: BackendKind::Constrained };
        assert_eq!(err.to_string(), "constrained backend has no stored document");
        assert!(err.is_not_found());
        assert_eq!(err.backend(), BackendKind::Constrained);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BackendKind::Privileged).unwrap(), "\"privileged\"");
    }
}
