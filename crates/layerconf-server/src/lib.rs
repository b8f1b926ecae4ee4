//! layerconf Server
//!
//! warp routes over a [`SettingsService`](layerconf_core::SettingsService),
//! plus the wiring and tracing setup used by the `layerconf-server` binary.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod app;
pub mod routes;
pub mod telemetry;

pub use app::{build_service, StorageMode};
pub use routes::{error_reply, routes, MAX_BODY_BYTES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
