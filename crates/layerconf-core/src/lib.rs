//! layerconf Core
//!
//! Persistence and the request-level settings operations:
//! - [`PersistenceOrchestrator`]: ordered fallback over storage adapters
//! - [`DiagnosticsState`]: which backend served what, and recent failures
//! - [`SettingsService`]: effective reads, scoped writes, health
//!
//! # Example
//!
//! ```rust,ignore
//! use layerconf_backend::BackendConfig;
//! use layerconf_core::SettingsService;
//! use layerconf_document::ResolutionContext;
//!
//! let service = SettingsService::from_backend_config(&BackendConfig::from_env()?);
//! let ctx = ResolutionContext::new().with_location("loc1").with_role("Groomer");
//! let resolution = service.effective(&ctx).await?;
//! println!("{}", resolution.effective.to_json());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod service;

pub use diagnostics::{DataSource, DiagnosticsRecord, DiagnosticsState, ErrorEntry, READ_ERROR_CAPACITY};
pub use error::{Operation, SettingsError};
pub use orchestrator::{OrchestratorConfig, PersistenceOrchestrator};
pub use service::{HealthReport, SettingsService, WriteOutcome, WriteRequest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
