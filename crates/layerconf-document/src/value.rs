//! Typed setting values
//!
//! A [`SettingValue`] is one leaf or nested object inside a configuration
//! section. Null is deliberately not representable.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single typed setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Boolean flag
    Bool(bool),
    /// Integer or floating point number
    Number(serde_json::Number),
    /// UTF-8 string
    String(String),
    /// Ordered list, replaced wholesale on merge
    Array(Vec<SettingValue>),
    /// Nested object, merged key-by-key
    Object(BTreeMap<String, SettingValue>),
}

/// Coarse value kind used for schema checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `true` / `false`
    Bool,
    /// Any number
    Number,
    /// Any string
    String,
    /// Any array
    Array,
    /// Nested object
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

impl SettingValue {
    /// Create a floating point value, `None` for NaN or infinity
    #[inline]
    #[must_use]
    pub fn float(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Number)
    }

    /// Create an object value from key/value pairs
    #[must_use]
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<SettingValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Kind of this value
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, SettingValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Deep-merge `other` into `self` without any schema checks
    ///
    /// Objects merge key-by-key; every other pairing is replaced wholesale.
    /// This is the storage-side merge used when accumulating partial writes
    /// into a fragment. Resolution uses the schema-checked merge instead.
    pub fn merge_from(&mut self, other: &SettingValue) {
        match (self, other) {
            (Self::Object(ours), Self::Object(theirs)) => {
                for (key, value) in theirs {
                    match ours.get_mut(key) {
                        Some(existing) => existing.merge_from(value),
                        None => {
                            ours.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            (slot, value) => *slot = value.clone(),
        }
    }

    /// Convert from JSON, recording the dotted path for error reporting
    pub(crate) fn from_json(value: serde_json::Value, path: &str) -> Result<Self, DocumentError> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => return Err(DocumentError::NullValue { path: path.to_string() }),
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Self::from_json(item, &format!("{path}[{i}]")))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let child = format!("{path}.{k}");
                        Self::from_json(v, &child).map(|v| (k, v))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl TryFrom<serde_json::Value> for SettingValue {
    type Error = DocumentError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_json(value, "$")
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for SettingValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<SettingValue>> From<Vec<T>> for SettingValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds() {
        assert_eq!(SettingValue::from(true).kind(), ValueKind::Bool);
        assert_eq!(SettingValue::from(3).kind(), ValueKind::Number);
        assert_eq!(SettingValue::from("x").kind(), ValueKind::String);
        assert_eq!(SettingValue::from(vec![1, 2]).kind(), ValueKind::Array);
        assert_eq!(
            SettingValue::object([("a", 1)]).kind(),
            ValueKind::Object
        );
    }

    #[test]
    fn float_rejects_nan() {
        assert!(SettingValue::float(f64::NAN).is_none());
        assert_eq!(SettingValue::float(1.5).and_then(|v| v.as_f64()), Some(1.5));
    }

    #[test]
    fn raw_merge_is_deep_for_objects() {
        let mut base = SettingValue::object([("a", 1), ("b", 2)]);
        base.merge_from(&SettingValue::object([("b", 3), ("c", 4)]));

        let map = base.as_object().unwrap();
        assert_eq!(map["a"].as_i64(), Some(1));
        assert_eq!(map["b"].as_i64(), Some(3));
        assert_eq!(map["c"].as_i64(), Some(4));
    }

    #[test]
    fn raw_merge_replaces_arrays() {
        let mut base = SettingValue::from(vec!["mon", "tue"]);
        base.merge_from(&SettingValue::from(vec!["sat"]));
        assert_eq!(base, SettingValue::from(vec!["sat"]));
    }

    #[test]
    fn null_is_rejected_with_path() {
        let err = SettingValue::try_from(json!({"a": {"b": null}})).unwrap_err();
        assert_eq!(err.to_string(), "null is not a setting value (at '$.a.b')");
    }

    #[test]
    fn untagged_serde_preserves_integers() {
        let value: SettingValue = serde_json::from_str("30").unwrap();
        assert_eq!(value.as_i64(), Some(30));
        assert_eq!(serde_json::to_string(&value).unwrap(), "30");
    }

    #[test]
    fn untagged_serde_rejects_null() {
        assert!(serde_json::from_str::<SettingValue>("null").is_err());
    }
}
