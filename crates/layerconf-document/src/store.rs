//! Fragment storage
//!
//! [`ScopeStore`] indexes fragments by [`ScopeKey`]. [`StoredDocument`] is the
//! persisted layout: one per deployment, holding the org baseline plus every
//! scope fragment.

use crate::document::ConfigurationDocument;
use crate::error::DocumentError;
use crate::scope::{ScopeFragment, ScopeKey, ScopeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse override fragments keyed by `(scope type, scope id)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeStore {
    fragments: BTreeMap<ScopeKey, ConfigurationDocument>,
}

impl ScopeStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence; duplicate keys are merged in sequence order
    #[must_use]
    pub fn from_fragments<'a>(fragments: impl IntoIterator<Item = &'a ScopeFragment>) -> Self {
        let mut store = Self::new();
        for fragment in fragments {
            store.merge(&fragment.scope, &fragment.settings);
        }
        store
    }

    /// Replace the fragment at `key`, returning the previous one
    pub fn put(&mut self, key: ScopeKey, settings: ConfigurationDocument) -> Option<ConfigurationDocument> {
        self.fragments.insert(key, settings)
    }

    /// Deep-merge `patch` into the fragment at `key`, creating it if needed
    pub fn merge(&mut self, key: &ScopeKey, patch: &ConfigurationDocument) {
        self.fragments
            .entry(key.clone())
            .or_default()
            .merge_from(patch);
    }

    #[inline]
    pub fn remove(&mut self, key: &ScopeKey) -> Option<ConfigurationDocument> {
        self.fragments.remove(key)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &ScopeKey) -> Option<&ConfigurationDocument> {
        self.fragments.get(key)
    }

    /// Fragment for a layer and id, if stored
    #[must_use]
    pub fn get_for(&self, layer: ScopeType, id: &str) -> Option<&ConfigurationDocument> {
        let key = ScopeKey::scoped(layer, id).ok()?;
        self.fragments.get(&key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// All fragments in key order
    #[must_use]
    pub fn fragments(&self) -> Vec<ScopeFragment> {
        self.fragments
            .iter()
            .map(|(key, settings)| ScopeFragment::new(key.clone(), settings.clone()))
            .collect()
    }
}

/// The persisted settings unit of one deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Stored org-level overrides, overlaid on the built-in defaults
    #[serde(default)]
    pub org: ConfigurationDocument,
    /// Non-org fragments, unique per scope key
    #[serde(default)]
    pub fragments: Vec<ScopeFragment>,
}

/// Result of [`StoredDocument::from_json_lenient`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LenientDecode {
    pub document: StoredDocument,
    /// Everything skipped while decoding, in document order
    pub dropped: Vec<DocumentError>,
}

impl StoredDocument {
    /// Decode a persisted row, skipping corrupt parts instead of failing
    ///
    /// Sections, entries and fragments that cannot be represented are left
    /// out and listed in [`LenientDecode::dropped`]. A missing or null `org`
    /// or `fragments` is treated as empty.
    ///
    /// # Errors
    /// `DocumentError::ExpectedObject` only when the row itself is not an
    /// object.
    pub fn from_json_lenient(value: serde_json::Value) -> Result<LenientDecode, DocumentError> {
        let serde_json::Value::Object(mut map) = value else {
            return Err(DocumentError::ExpectedObject { path: "$".to_string() });
        };

        let mut dropped = Vec::new();
        let org = match map.remove("org") {
            None | Some(serde_json::Value::Null) => ConfigurationDocument::new(),
            Some(raw) => ConfigurationDocument::from_json_lenient(raw, "$.org", &mut dropped),
        };

        let mut fragments = Vec::new();
        match map.remove("fragments") {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Array(items)) => {
                for (index, item) in items.into_iter().enumerate() {
                    let path = format!("$.fragments[{index}]");
                    if let Some(fragment) = ScopeFragment::from_json_lenient(item, &path, &mut dropped) {
                        fragments.push(fragment);
                    }
                }
            }
            Some(_) => dropped.push(DocumentError::ExpectedArray {
                path: "$.fragments".to_string(),
            }),
        }

        Ok(LenientDecode {
            document: Self { org, fragments },
            dropped,
        })
    }

    /// Document used when no row exists yet
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.org.is_empty() && self.fragments.iter().all(|f| f.settings.is_empty())
    }

    /// Index the non-org fragments
    #[must_use]
    pub fn scope_store(&self) -> ScopeStore {
        ScopeStore::from_fragments(
            self.fragments
                .iter()
                .filter(|f| f.scope.scope_type() != ScopeType::Org),
        )
    }

    /// Canonical form
    ///
    /// Org-typed entries in `fragments` are folded into `org`, duplicates are
    /// merged, and fragments are sorted by key.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut org = self.org.clone();
        for fragment in &self.fragments {
            if fragment.scope.scope_type() == ScopeType::Org {
                org.merge_from(&fragment.settings);
            }
        }
        Self {
            org,
            fragments: self.scope_store().fragments(),
        }
    }

    /// Apply a write to one scope and return the resulting document
    ///
    /// With `replace` the scope's fragment is overwritten; otherwise `patch`
    /// is deep-merged into it.
    #[must_use]
    pub fn with_write(&self, scope: &ScopeKey, patch: &ConfigurationDocument, replace: bool) -> Self {
        let mut next = self.normalized();
        if scope.scope_type() == ScopeType::Org {
            if replace {
                next.org = patch.clone();
            } else {
                next.org.merge_from(patch);
            }
            return next;
        }

        let mut store = next.scope_store();
        if replace {
            store.put(scope.clone(), patch.clone());
        } else {
            store.merge(scope, patch);
        }
        next.fragments = store.fragments();
        next
    }
}
