//! Organisation-wide baseline configuration
//!
//! The built-in baseline is total: it defines every section and key the
//! application recognises. Resolution uses it as the schema, so a key that is
//! not present here can never appear in an effective configuration.

use crate::document::{ConfigurationDocument, Section};
use crate::value::SettingValue;
use std::sync::Arc;

/// Supplies the immutable baseline
#[derive(Debug, Clone)]
pub struct DefaultsProvider {
    baseline: Arc<ConfigurationDocument>,
}

impl DefaultsProvider {
    /// Provider with the built-in baseline
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_document(builtin_baseline())
    }

    /// Provider with a caller-supplied baseline
    #[must_use]
    pub fn from_document(baseline: ConfigurationDocument) -> Self {
        Self {
            baseline: Arc::new(baseline),
        }
    }

    /// Borrow the baseline
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &ConfigurationDocument {
        &self.baseline
    }

    /// Owned copy of the baseline
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ConfigurationDocument {
        self.baseline.as_ref().clone()
    }
}

impl Default for DefaultsProvider {
    fn default() -> Self {
        Self::builtin()
    }
}

fn section<const N: usize>(entries: [(&str, SettingValue); N]) -> Section {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn builtin_baseline() -> ConfigurationDocument {
    let mut doc = ConfigurationDocument::new();

    doc.insert_section(
        "business",
        section([
            ("name", "".into()),
            ("timezone", "UTC".into()),
            ("currency", "USD".into()),
            ("locale", "en-US".into()),
            ("contactEmail", "".into()),
        ]),
    );

    doc.insert_section(
        "scheduling",
        section([
            ("slotMinutes", 30.into()),
            ("openHour", 9.into()),
            ("closeHour", 17.into()),
            ("bufferMinutes", 0.into()),
            ("allowDoubleBooking", false.into()),
            ("workingDays", vec!["mon", "tue", "wed", "thu", "fri"].into()),
        ]),
    );

    doc.insert_section(
        "payroll",
        section([
            ("period", "biweekly".into()),
            ("overtimeThresholdHours", 40.into()),
            (
                "commission",
                SettingValue::object([
                    ("enabled", SettingValue::from(false)),
                    ("ratePercent", SettingValue::from(0)),
                ]),
            ),
            (
                "tips",
                SettingValue::object([
                    ("pooled", SettingValue::from(false)),
                    ("payoutMethod", SettingValue::from("payroll")),
                ]),
            ),
        ]),
    );

    doc.insert_section(
        "messaging",
        section([
            ("remindersEnabled", true.into()),
            ("reminderLeadHours", 24.into()),
            ("smsEnabled", false.into()),
            ("senderName", "".into()),
        ]),
    );

    doc.insert_section(
        "theme",
        section([
            ("mode", "light".into()),
            ("primaryColor", "#2563eb".into()),
            ("accentColor", "#f59e0b".into()),
            ("logoUrl", "".into()),
        ]),
    );

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_total_for_known_sections() {
        let defaults = DefaultsProvider::builtin();
        for name in ["business", "scheduling", "payroll", "messaging", "theme"] {
            let section = defaults.defaults().section(name);
            assert!(section.is_some_and(|s| !s.is_empty()), "missing section {name}");
        }
    }

    #[test]
    fn builtin_slot_minutes() {
        let defaults = DefaultsProvider::default();
        assert_eq!(
            defaults.defaults().get("scheduling", "slotMinutes").and_then(SettingValue::as_i64),
            Some(30)
        );
    }

    #[test]
    fn snapshot_is_independent() {
        let defaults = DefaultsProvider::builtin();
        let mut copy = defaults.snapshot();
        copy.set("theme", "mode", "dark");
        assert_eq!(
            defaults.defaults().get("theme", "mode").and_then(SettingValue::as_str),
            Some("light")
        );
    }
}
