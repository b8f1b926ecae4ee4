//! Backend configuration
//!
//! Credentials and endpoint are presence-checked only. A missing privileged
//! key disables the privileged adapter; it is never a startup error.

use crate::error::ConfigError;
use serde::Serialize;
use std::time::Duration;

/// Environment variable names
pub mod env {
    pub const ENDPOINT_URL: &str = "LAYERCONF_ENDPOINT_URL";
    pub const PRIVILEGED_KEY: &str = "LAYERCONF_PRIVILEGED_KEY";
    pub const SESSION_KEY: &str = "LAYERCONF_SESSION_KEY";
    pub const TABLE: &str = "LAYERCONF_TABLE";
    pub const DEPLOYMENT_ID: &str = "LAYERCONF_DEPLOYMENT_ID";
    pub const READ_FN: &str = "LAYERCONF_READ_FN";
    pub const SAVE_FN: &str = "LAYERCONF_SAVE_FN";
    pub const TIMEOUT_MS: &str = "LAYERCONF_TIMEOUT_MS";
}

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage backend configuration
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the hosted database REST gateway
    pub endpoint_url: Option<String>,
    /// Elevated credential for the privileged adapter
    pub privileged_key: Option<String>,
    /// Session credential for the constrained adapter
    pub session_key: Option<String>,
    /// Settings table read/written by the privileged adapter
    pub table: String,
    /// Row key: one stored document per deployment
    pub deployment_id: String,
    /// Read procedure used by the constrained adapter
    pub read_fn: String,
    /// Save procedure used by the constrained adapter
    pub save_fn: String,
    /// Bound on each network round trip
    pub request_timeout: Duration,
}

// Credentials stay out of logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("privileged_key", &self.privileged_key.as_ref().map(|_| "<redacted>"))
            .field("session_key", &self.session_key.as_ref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .field("deployment_id", &self.deployment_id)
            .field("read_fn", &self.read_fn)
            .field("save_fn", &self.save_fn)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Which credentials are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvPresence {
    pub endpoint_url: bool,
    pub privileged_credential: bool,
    pub constrained_credential: bool,
}

impl BackendConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = non_empty(Some(url.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_privileged_key(mut self, key: impl Into<String>) -> Self {
        self.privileged_key = non_empty(Some(key.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = non_empty(Some(key.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_deployment_id(mut self, id: impl Into<String>) -> Self {
        self.deployment_id = id.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load from process environment
    ///
    /// # Errors
    /// `ConfigError::InvalidEnvVar` if `LAYERCONF_TIMEOUT_MS` is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary lookup function
    ///
    /// # Errors
    /// Same as [`BackendConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            endpoint_url: non_empty(lookup(env::ENDPOINT_URL)),
            privileged_key: non_empty(lookup(env::PRIVILEGED_KEY)),
            session_key: non_empty(lookup(env::SESSION_KEY)),
            ..Self::default()
        };

        if let Some(table) = non_empty(lookup(env::TABLE)) {
            config.table = table;
        }
        if let Some(id) = non_empty(lookup(env::DEPLOYMENT_ID)) {
            config.deployment_id = id;
        }
        if let Some(name) = non_empty(lookup(env::READ_FN)) {
            config.read_fn = name;
        }
        if let Some(name) = non_empty(lookup(env::SAVE_FN)) {
            config.save_fn = name;
        }
        if let Some(raw) = non_empty(lookup(env::TIMEOUT_MS)) {
            let ms = raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::invalid_env_var(env::TIMEOUT_MS, "expected positive integer milliseconds"))?;
            config.request_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Presence booleans for health reporting
    #[must_use]
    pub fn presence(&self) -> EnvPresence {
        EnvPresence {
            endpoint_url: self.endpoint_url.is_some(),
            privileged_credential: self.privileged_key.is_some(),
            constrained_credential: self.session_key.is_some(),
        }
    }

    /// Whether the privileged adapter can be used
    #[inline]
    #[must_use]
    pub fn privileged_configured(&self) -> bool {
        self.endpoint_url.is_some() && self.privileged_key.is_some()
    }

    /// Whether the constrained adapter can be used
    #[inline]
    #[must_use]
    pub fn constrained_configured(&self) -> bool {
        self.endpoint_url.is_some() && self.session_key.is_some()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            privileged_key: None,
            session_key: None,
            table: "app_settings".to_string(),
            deployment_id: "default".to_string(),
            read_fn: "get_app_settings".to_string(),
            save_fn: "save_app_settings".to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
