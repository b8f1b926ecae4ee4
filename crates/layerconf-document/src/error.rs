//! Error types for configuration documents and scopes

use crate::scope::ScopeType;

/// Errors while building documents or scope keys
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// `org` scope was given an identifier
    #[error("scope '{0}' does not take an identifier")]
    UnexpectedScopeId(ScopeType),

    /// Non-org scope without an identifier
    #[error("scope '{0}' requires an identifier")]
    MissingScopeId(ScopeType),

    /// Scope type string not recognised
    #[error("unknown scope type: '{0}'")]
    UnknownScopeType(String),

    /// JSON null somewhere in a document
    #[error("null is not a setting value (at '{path}')")]
    NullValue { path: String },

    /// Document or section was not a JSON object
    #[error("expected an object at '{path}'")]
    ExpectedObject { path: String },

    /// Fragment list was not a JSON array
    #[error("expected an array at '{path}'")]
    ExpectedArray { path: String },

    /// Stored fragment with a missing or invalid scope
    #[error("invalid fragment at '{path}': {message}")]
    InvalidFragment { path: String, message: String },
}
