//! Schema-checked deep merge
//!
//! The accumulator doubles as the schema: it starts as a copy of a total
//! baseline and only ever receives keys that already exist in it with the
//! same value kind. Anything else is reported as a [`SchemaViolation`] and
//! skipped.

use layerconf_document::{ConfigurationDocument, ScopeKey, SettingValue, ValueKind};
use serde::Serialize;

/// A fragment entry that did not fit the baseline schema
///
/// These are warnings. Resolution keeps going and the offending entry is
/// simply not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaViolation {
    /// Section name not present in the baseline
    #[error("{scope}: unknown section '{section}'")]
    UnknownSection { scope: ScopeKey, section: String },

    /// Key (or nested key) not present in the baseline
    #[error("{scope}: unknown key '{path}'")]
    UnknownKey { scope: ScopeKey, path: String },

    /// Key present, but with a different value kind
    #[error("{scope}: '{path}' expects {expected}, got {found}")]
    TypeMismatch {
        scope: ScopeKey,
        path: String,
        expected: ValueKind,
        found: ValueKind,
    },
}

impl SchemaViolation {
    /// Scope whose fragment raised the violation
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &ScopeKey {
        match self {
            Self::UnknownSection { scope, .. }
            | Self::UnknownKey { scope, .. }
            | Self::TypeMismatch { scope, .. } => scope,
        }
    }
}

/// Merge `overlay` into `target`, keeping `target`'s shape
///
/// - objects merge key-by-key, recursively
/// - scalars and arrays overwrite wholesale
/// - unknown sections/keys and kind mismatches are pushed to `violations`
pub fn merge_checked(
    target: &mut ConfigurationDocument,
    overlay: &ConfigurationDocument,
    scope: &ScopeKey,
    violations: &mut Vec<SchemaViolation>,
) {
    for (name, entries) in overlay.sections() {
        let Some(section) = target.section_mut(name) else {
            violations.push(SchemaViolation::UnknownSection {
                scope: scope.clone(),
                section: name.clone(),
            });
            continue;
        };

        for (key, value) in entries {
            let path = format!("{name}.{key}");
            match section.get_mut(key) {
                Some(slot) => merge_value(slot, value, &path, scope, violations),
                None => violations.push(SchemaViolation::UnknownKey {
                    scope: scope.clone(),
                    path,
                }),
            }
        }
    }
}

fn merge_value(
    slot: &mut SettingValue,
    value: &SettingValue,
    path: &str,
    scope: &ScopeKey,
    violations: &mut Vec<SchemaViolation>,
) {
    if slot.kind() != value.kind() {
        violations.push(SchemaViolation::TypeMismatch {
            scope: scope.clone(),
            path: path.to_string(),
            expected: slot.kind(),
            found: value.kind(),
        });
        return;
    }

    match (slot, value) {
        (SettingValue::Object(ours), SettingValue::Object(theirs)) => {
            for (key, child) in theirs {
                let child_path = format!("{path}.{key}");
                match ours.get_mut(key) {
                    Some(existing) => merge_value(existing, child, &child_path, scope, violations),
                    None => violations.push(SchemaViolation::UnknownKey {
                        scope: scope.clone(),
                        path: child_path,
                    }),
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
