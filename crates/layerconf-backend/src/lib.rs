//! layerconf Storage Backends
//!
//! Two structurally different paths to the same stored settings row:
//!
//! - [`PrivilegedAdapter`]: elevated credential, direct table access,
//!   bypasses row-level policy
//! - [`ConstrainedAdapter`]: session credential, stored procedures,
//!   subject to row-level policy
//!
//! Both implement [`BackendAdapter`]; so does [`MemoryBackend`], the
//! in-process stand-in used by tests and local runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use layerconf_backend::{BackendAdapter, BackendConfig, ConstrainedAdapter};
//!
//! let config = BackendConfig::from_env()?;
//! let adapter = ConstrainedAdapter::new(&config);
//! let stored = adapter.read().await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod adapter;
pub mod config;
pub mod constrained;
pub mod error;
mod http;
pub mod memory;
pub mod privileged;

pub use adapter::BackendAdapter;
pub use config::{BackendConfig, EnvPresence, DEFAULT_TIMEOUT};
pub use constrained::ConstrainedAdapter;
pub use error::{BackendError, BackendKind, ConfigError};
pub use memory::MemoryBackend;
pub use privileged::PrivilegedAdapter;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
