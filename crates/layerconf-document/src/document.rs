//! Configuration documents
//!
//! A [`ConfigurationDocument`] maps section names to [`Section`]s, and each
//! section maps setting keys to [`SettingValue`]s. The same type is used for
//! complete baselines and for sparse override fragments.

use crate::error::DocumentError;
use crate::value::SettingValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configuration section: setting key to value
pub type Section = BTreeMap<String, SettingValue>;

/// Section name to section mapping
///
/// Ordered maps keep serialization byte-for-byte stable, so two equal
/// documents always encode identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationDocument {
    sections: BTreeMap<String, Section>,
}

impl ConfigurationDocument {
    /// Create an empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for a single key
    #[inline]
    #[must_use]
    pub fn with(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Self {
        self.set(section, key, value);
        self
    }

    /// Set a single key, creating the section if needed
    pub fn set(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Option<SettingValue> {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into())
    }

    /// Insert or replace a whole section
    pub fn insert_section(&mut self, name: impl Into<String>, section: Section) -> Option<Section> {
        self.sections.insert(name.into(), section)
    }

    #[inline]
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&SettingValue> {
        self.sections.get(section).and_then(|s| s.get(key))
    }

    /// Look up a dotted path such as `payroll.commission.ratePercent`
    ///
    /// The first segment names the section, the second the key, and any
    /// further segments descend into nested objects.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&SettingValue> {
        let mut segments = path.split('.');
        let section = segments.next()?;
        let key = segments.next()?;
        let mut current = self.get(section, key)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Iterate sections in name order
    pub fn sections(&self) -> impl Iterator<Item = (&String, &Section)> {
        self.sections.iter()
    }

    /// Mutable access to an existing section
    #[inline]
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }

    /// Number of sections, including empty ones
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Deep-merge `other` into `self` without schema checks
    ///
    /// Used to accumulate partial writes into a stored fragment. Unknown keys
    /// are kept; they are filtered later, at resolution time.
    pub fn merge_from(&mut self, other: &ConfigurationDocument) {
        for (name, theirs) in &other.sections {
            let ours = self.sections.entry(name.clone()).or_default();
            for (key, value) in theirs {
                match ours.get_mut(key) {
                    Some(existing) => existing.merge_from(value),
                    None => {
                        ours.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }

    /// Convert to a plain JSON value
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl ConfigurationDocument {
    /// Convert from JSON, dropping what cannot be represented
    ///
    /// Non-object sections and entries holding a null anywhere are skipped
    /// and reported in `dropped`. A non-object root yields an empty document.
    pub fn from_json_lenient(value: serde_json::Value, path: &str, dropped: &mut Vec<DocumentError>) -> Self {
        let serde_json::Value::Object(map) = value else {
            dropped.push(DocumentError::ExpectedObject { path: path.to_string() });
            return Self::new();
        };

        let mut doc = Self::new();
        for (name, section) in map {
            let section_path = format!("{path}.{name}");
            let serde_json::Value::Object(entries) = section else {
                dropped.push(DocumentError::ExpectedObject { path: section_path });
                continue;
            };
            let mut parsed = Section::new();
            for (key, value) in entries {
                let child = format!("{section_path}.{key}");
                match SettingValue::from_json(value, &child) {
                    Ok(value) => {
                        parsed.insert(key, value);
                    }
                    Err(error) => dropped.push(error),
                }
            }
            doc.sections.insert(name, parsed);
        }
        doc
    }
}

impl TryFrom<serde_json::Value> for ConfigurationDocument {
    type Error = DocumentError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let serde_json::Value::Object(map) = value else {
            return Err(DocumentError::ExpectedObject { path: "$".to_string() });
        };

        let mut doc = Self::new();
        for (name, section) in map {
            let path = format!("$.{name}");
            let serde_json::Value::Object(entries) = section else {
                return Err(DocumentError::ExpectedObject { path });
            };
            let mut parsed = Section::new();
            for (key, value) in entries {
                let child = format!("{path}.{key}");
                parsed.insert(key, SettingValue::from_json(value, &child)?);
            }
            doc.sections.insert(name, parsed);
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn builder_and_lookup() {
        let doc = ConfigurationDocument::new()
            .with("scheduling", "slotMinutes", 30)
            .with("theme", "mode", "dark");

        assert_eq!(doc.get("scheduling", "slotMinutes").and_then(SettingValue::as_i64), Some(30));
        assert_eq!(doc.get("theme", "mode").and_then(SettingValue::as_str), Some("dark"));
        assert!(doc.get("theme", "missing").is_none());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn dotted_path_descends_objects() {
        let doc = ConfigurationDocument::new().with(
            "payroll",
            "commission",
            SettingValue::object([("ratePercent", 12)]),
        );

        assert_eq!(
            doc.get_path("payroll.commission.ratePercent").and_then(SettingValue::as_i64),
            Some(12)
        );
        assert!(doc.get_path("payroll").is_none());
        assert!(doc.get_path("payroll.commission.nope").is_none());
    }

    #[test]
    fn json_roundtrip_is_stable() {
        let raw = json!({
            "theme": {"mode": "light", "primaryColor": "#2563eb"},
            "scheduling": {"slotMinutes": 30, "workingDays": ["mon", "tue"]}
        });
        let doc = ConfigurationDocument::try_from(raw.clone()).unwrap();
        assert_eq!(doc.to_json(), raw);

        let a = serde_json::to_string(&doc).unwrap();
        let b = serde_json::to_string(&doc.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_object_section_is_rejected() {
        let err = ConfigurationDocument::try_from(json!({"theme": 3})).unwrap_err();
        assert_eq!(err, DocumentError::ExpectedObject { path: "$.theme".to_string() });
    }

    #[test]
    fn lenient_conversion_skips_bad_entries() {
        let raw = json!({
            "theme": {"mode": null, "primaryColor": "#2563eb"},
            "scheduling": 3,
            "payroll": {"commission": {"ratePercent": null}, "currency": "EUR"}
        });
        let mut dropped = Vec::new();
        let doc = ConfigurationDocument::from_json_lenient(raw, "$", &mut dropped);

        assert_eq!(doc.get("theme", "primaryColor").and_then(SettingValue::as_str), Some("#2563eb"));
        assert!(doc.get("theme", "mode").is_none());
        assert!(doc.section("scheduling").is_none());
        assert!(doc.get("payroll", "commission").is_none());
        assert_eq!(doc.get("payroll", "currency").and_then(SettingValue::as_str), Some("EUR"));
        assert_eq!(dropped.len(), 3);
        assert!(dropped.contains(&DocumentError::NullValue { path: "$.payroll.commission.ratePercent".to_string() }));
        assert!(dropped.contains(&DocumentError::ExpectedObject { path: "$.scheduling".to_string() }));
        assert!(dropped.contains(&DocumentError::NullValue { path: "$.theme.mode".to_string() }));
    }

    #[test]
    fn unchecked_merge_keeps_unknown_keys() {
        let mut stored = ConfigurationDocument::new().with("theme", "mode", "light");
        stored.merge_from(&ConfigurationDocument::new().with("theme", "legacyFlag", true));

        assert_eq!(stored.get("theme", "mode").and_then(SettingValue::as_str), Some("light"));
        assert_eq!(stored.get("theme", "legacyFlag").and_then(SettingValue::as_bool), Some(true));
    }

    #[test]
    fn empty_sections_count_as_empty() {
        let mut doc = ConfigurationDocument::new();
        assert!(doc.is_empty());
        doc.insert_section("theme", Section::new());
        assert!(doc.is_empty());
        assert!(doc.section_mut("theme").is_some());
        doc.set("theme", "mode", "dark");
        assert!(!doc.is_empty());
    }
}
