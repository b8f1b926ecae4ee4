//! Scope layers, fragment keys and resolution contexts

use crate::document::ConfigurationDocument;
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Override scope layer
///
/// Variant order is precedence order: a later variant wins over an earlier
/// one when both set the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// Organisation-wide baseline
    Org,
    /// Physical location / branch
    Location,
    /// Staff role
    Role,
    /// Individual user
    User,
    /// Individual device
    Device,
}

impl ScopeType {
    /// Every layer, lowest precedence first
    pub const ALL: [ScopeType; 5] = [
        ScopeType::Org,
        ScopeType::Location,
        ScopeType::Role,
        ScopeType::User,
        ScopeType::Device,
    ];

    /// Layers applied over the org baseline, lowest precedence first
    pub const OVERRIDE_LAYERS: [ScopeType; 4] = [
        ScopeType::Location,
        ScopeType::Role,
        ScopeType::User,
        ScopeType::Device,
    ];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Location => "location",
            Self::Role => "role",
            Self::User => "user",
            Self::Device => "device",
        }
    }

    /// Whether fragments of this type carry a scope id
    #[inline]
    #[must_use]
    pub fn requires_id(self) -> bool {
        !matches!(self, Self::Org)
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "org" => Ok(Self::Org),
            "location" => Ok(Self::Location),
            "role" => Ok(Self::Role),
            "user" => Ok(Self::User),
            "device" => Ok(Self::Device),
            other => Err(DocumentError::UnknownScopeType(other.to_string())),
        }
    }
}

/// Unique key of a stored fragment: `(scope type, scope id)`
///
/// Construction validates that `org` has no id and every other type has a
/// non-empty one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawScopeKey", into = "RawScopeKey")]
pub struct ScopeKey {
    scope_type: ScopeType,
    scope_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct RawScopeKey {
    #[serde(rename = "type")]
    scope_type: ScopeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl TryFrom<RawScopeKey> for ScopeKey {
    type Error = DocumentError;

    fn try_from(raw: RawScopeKey) -> Result<Self, Self::Error> {
        Self::new(raw.scope_type, raw.id)
    }
}

impl From<ScopeKey> for RawScopeKey {
    fn from(key: ScopeKey) -> Self {
        Self {
            scope_type: key.scope_type,
            id: key.scope_id,
        }
    }
}

impl ScopeKey {
    /// Validate and build a key
    ///
    /// # Errors
    /// - `DocumentError::UnexpectedScopeId` for `org` with an id
    /// - `DocumentError::MissingScopeId` for other types without a non-empty id
    ///
    /// Surrounding whitespace is trimmed from the id.
    pub fn new(scope_type: ScopeType, scope_id: Option<String>) -> Result<Self, DocumentError> {
        let scope_id = scope_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        match (scope_type.requires_id(), scope_id.is_some()) {
            (false, true) => Err(DocumentError::UnexpectedScopeId(scope_type)),
            (true, false) => Err(DocumentError::MissingScopeId(scope_type)),
            _ => Ok(Self { scope_type, scope_id }),
        }
    }

    /// The org key
    #[inline]
    #[must_use]
    pub fn org() -> Self {
        Self {
            scope_type: ScopeType::Org,
            scope_id: None,
        }
    }

    /// Key for a non-org layer
    ///
    /// # Errors
    /// Same rules as [`ScopeKey::new`].
    pub fn scoped(scope_type: ScopeType, id: impl Into<String>) -> Result<Self, DocumentError> {
        Self::new(scope_type, Some(id.into()))
    }

    #[inline]
    #[must_use]
    pub fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    #[inline]
    #[must_use]
    pub fn scope_id(&self) -> Option<&str> {
        self.scope_id.as_deref()
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope_id {
            Some(id) => write!(f, "{}/{}", self.scope_type, id),
            None => write!(f, "{}", self.scope_type),
        }
    }
}

/// Partial configuration attached to one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeFragment {
    /// Which scope this fragment overrides
    pub scope: ScopeKey,
    /// Sparse settings for that scope
    #[serde(default)]
    pub settings: ConfigurationDocument,
}

impl ScopeFragment {
    #[inline]
    #[must_use]
    pub fn new(scope: ScopeKey, settings: ConfigurationDocument) -> Self {
        Self { scope, settings }
    }

    /// Fragment for a non-org layer
    ///
    /// # Errors
    /// Same rules as [`ScopeKey::new`].
    pub fn scoped(
        scope_type: ScopeType,
        id: impl Into<String>,
        settings: ConfigurationDocument,
    ) -> Result<Self, DocumentError> {
        Ok(Self::new(ScopeKey::scoped(scope_type, id)?, settings))
    }

    /// Convert one stored fragment from JSON, `None` if it has no usable scope
    pub(crate) fn from_json_lenient(
        value: serde_json::Value,
        path: &str,
        dropped: &mut Vec<DocumentError>,
    ) -> Option<Self> {
        let serde_json::Value::Object(mut map) = value else {
            dropped.push(DocumentError::ExpectedObject { path: path.to_string() });
            return None;
        };

        let invalid = |message: String| DocumentError::InvalidFragment {
            path: path.to_string(),
            message,
        };
        let scope = match map.remove("scope").map(serde_json::from_value::<ScopeKey>) {
            Some(Ok(scope)) => scope,
            Some(Err(error)) => {
                dropped.push(invalid(error.to_string()));
                return None;
            }
            None => {
                dropped.push(invalid("missing scope".to_string()));
                return None;
            }
        };

        let settings = match map.remove("settings") {
            None | Some(serde_json::Value::Null) => ConfigurationDocument::new(),
            Some(raw) => ConfigurationDocument::from_json_lenient(raw, &format!("{path}.settings"), dropped),
        };
        Some(Self::new(scope, settings))
    }
}

/// Scope identifiers supplied by the caller of a resolution
///
/// A missing identifier skips that layer entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl ResolutionContext {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_location(mut self, id: impl Into<String>) -> Self {
        self.location = Some(id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_role(mut self, id: impl Into<String>) -> Self {
        self.role = Some(id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_user(mut self, id: impl Into<String>) -> Self {
        self.user = Some(id.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_device(mut self, id: impl Into<String>) -> Self {
        self.device = Some(id.into());
        self
    }

    /// Identifier supplied for a layer; always `None` for `org`
    #[must_use]
    pub fn id_for(&self, layer: ScopeType) -> Option<&str> {
        let id = match layer {
            ScopeType::Org => None,
            ScopeType::Location => self.location.as_deref(),
            ScopeType::Role => self.role.as_deref(),
            ScopeType::User => self.user.as_deref(),
            ScopeType::Device => self.device.as_deref(),
        };
        id.map(str::trim).filter(|id| !id.is_empty())
    }

    /// Context that selects exactly the given scope and nothing else
    #[must_use]
    pub fn for_scope(key: &ScopeKey) -> Self {
        let mut ctx = Self::new();
        if let Some(id) = key.scope_id() {
            let id = Some(id.to_string());
            match key.scope_type() {
                ScopeType::Org => {}
                ScopeType::Location => ctx.location = id,
                ScopeType::Role => ctx.role = id,
                ScopeType::User => ctx.user = id,
                ScopeType::Device => ctx.device = id,
            }
        }
        ctx
    }
}
