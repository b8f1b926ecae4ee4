//! layerconf Resolution
//!
//! Merges a total baseline with the scope fragments selected by a
//! [`ResolutionContext`](layerconf_document::ResolutionContext).
//!
//! # Precedence
//!
//! ```text
//! device > user > role > location > org (defaults + stored org fragment)
//! ```
//!
//! A higher layer overwrites a lower one only for keys it explicitly sets.
//! Objects merge key-by-key, scalars and arrays are replaced wholesale.
//!
//! # Example
//!
//! ```rust
//! use layerconf_document::{ConfigurationDocument, ResolutionContext, ScopeFragment, ScopeType};
//! use layerconf_resolve::ResolutionEngine;
//!
//! let base = ConfigurationDocument::new().with("scheduling", "slotMinutes", 30);
//! let fragments = vec![ScopeFragment::scoped(
//!     ScopeType::Role,
//!     "Groomer",
//!     ConfigurationDocument::new().with("scheduling", "slotMinutes", 20),
//! )
//! .unwrap()];
//!
//! let ctx = ResolutionContext::new().with_role("Groomer");
//! let resolution = ResolutionEngine::new().resolve(&base, &fragments, &ctx);
//! assert_eq!(
//!     resolution.effective.get("scheduling", "slotMinutes").and_then(|v| v.as_i64()),
//!     Some(20)
//! );
//! ```

#![allow(missing_docs)]
#![warn(unreachable_pub)]

pub mod engine;
pub mod merge;

pub use engine::{EffectiveConfiguration, Resolution, ResolutionEngine};
pub use merge::{merge_checked, SchemaViolation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
