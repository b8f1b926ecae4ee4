//! layerconf Document Model
//!
//! Typed configuration documents, scope fragments and the built-in baseline.
//!
//! # Core Concepts
//!
//! - [`ConfigurationDocument`]: section name → key → [`SettingValue`]
//! - [`ScopeFragment`]: sparse document attached to a [`ScopeKey`]
//! - [`ScopeStore`]: fragments indexed by `(scope type, scope id)`
//! - [`StoredDocument`]: persisted layout, org baseline plus fragments
//! - [`DefaultsProvider`]: total baseline used as the schema
//!
//! # Example
//!
//! ```rust
//! use layerconf_document::{ConfigurationDocument, ScopeFragment, ScopeType};
//!
//! let fragment = ScopeFragment::scoped(
//!     ScopeType::Location,
//!     "loc1",
//!     ConfigurationDocument::new().with("scheduling", "slotMinutes", 10),
//! )
//! .unwrap();
//! assert_eq!(fragment.scope.to_string(), "location/loc1");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod defaults;
mod document;
mod error;
mod scope;
mod store;
mod value;

pub use defaults::DefaultsProvider;
pub use document::{ConfigurationDocument, Section};
pub use error::DocumentError;
pub use scope::{ResolutionContext, ScopeFragment, ScopeKey, ScopeType};
pub use store::{LenientDecode, ScopeStore, StoredDocument};
pub use value::{SettingValue, ValueKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
