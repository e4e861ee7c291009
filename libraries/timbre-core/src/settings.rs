//! Provider settings
//!
//! Each provider declares a `SettingsSchema`: the option names it understands,
//! their value types and permitted ranges. Callers hand in a `SettingsMap` and
//! the schema turns it into `ValidatedSettings` before any provider code runs.
//!
//! Values are never coerced. A `Text("16")` supplied for an integer option is a
//! type mismatch, not a best-effort parse. Omitted keys are fine; providers
//! apply their own defaults.
//!
//! # Example
//!
//! ```rust
//! use timbre_core::settings::{SettingValue, SettingsMap, SettingsSchema};
//!
//! let schema = SettingsSchema::new()
//!     .with_text_choices("PeakAnalysis", ["Simple", "Interpolated"])
//!     .with_int_range("Quality", 0, 10);
//!
//! let mut supplied = SettingsMap::new();
//! supplied.insert("Quality".to_string(), SettingValue::Int(7));
//!
//! let settings = schema.validate(&supplied).unwrap();
//! assert_eq!(settings.int("Quality"), Some(7));
//! assert_eq!(settings.text("PeakAnalysis"), None);
//! ```

use crate::error::{Result, TimbreError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Caller-supplied settings, keyed by option name
pub type SettingsMap = HashMap<String, SettingValue>;

/// A dynamically typed scalar settings value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl SettingValue {
    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Text(_) => "string",
            Self::Date(_) => "date",
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for SettingValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Declared type and constraint for one option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettingInfo {
    /// Any boolean
    Bool,
    /// Integer within an inclusive range
    IntRange { min: i64, max: i64 },
    /// Integer from a fixed set
    IntSet { values: Vec<i64> },
    /// String, optionally restricted to exact choices
    Text { choices: Option<Vec<String>> },
    /// Date within an inclusive range
    DateRange { min: NaiveDate, max: NaiveDate },
}

impl SettingInfo {
    /// Check one value against this declaration
    fn check(&self, key: &str, value: &SettingValue) -> Result<()> {
        let accepted = match (self, value) {
            (Self::Bool, SettingValue::Bool(_)) => true,
            (Self::IntRange { min, max }, SettingValue::Int(i)) => (*min..=*max).contains(i),
            (Self::IntSet { values }, SettingValue::Int(i)) => values.contains(i),
            (Self::Text { choices: None }, SettingValue::Text(_)) => true,
            (Self::Text { choices: Some(choices) }, SettingValue::Text(s)) => {
                choices.iter().any(|c| c == s)
            }
            (Self::DateRange { min, max }, SettingValue::Date(d)) => (*min..=*max).contains(d),
            _ => false,
        };

        if accepted {
            Ok(())
        } else {
            Err(TimbreError::invalid_setting_value(key, value))
        }
    }
}

/// The set of options a provider recognizes
///
/// Declared once per provider and immutable once the provider is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsSchema {
    entries: BTreeMap<String, SettingInfo>,
}

impl SettingsSchema {
    /// Create an empty schema (accepts only the empty map)
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, info: SettingInfo) -> Self {
        self.entries.insert(key.into(), info);
        self
    }

    /// Declare a boolean option
    #[must_use]
    pub fn with_bool(self, key: impl Into<String>) -> Self {
        self.with(key, SettingInfo::Bool)
    }

    /// Declare an integer option within `min..=max`
    #[must_use]
    pub fn with_int_range(self, key: impl Into<String>, min: i64, max: i64) -> Self {
        self.with(key, SettingInfo::IntRange { min, max })
    }

    /// Declare an integer option restricted to `values`
    #[must_use]
    pub fn with_int_set(self, key: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        self.with(
            key,
            SettingInfo::IntSet {
                values: values.into_iter().collect(),
            },
        )
    }

    /// Declare a free-form string option
    #[must_use]
    pub fn with_text(self, key: impl Into<String>) -> Self {
        self.with(key, SettingInfo::Text { choices: None })
    }

    /// Declare a string option restricted to `choices`
    #[must_use]
    pub fn with_text_choices<I, S>(self, key: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(
            key,
            SettingInfo::Text {
                choices: Some(choices.into_iter().map(Into::into).collect()),
            },
        )
    }

    /// Declare a date option within `min..=max`
    #[must_use]
    pub fn with_date_range(self, key: impl Into<String>, min: NaiveDate, max: NaiveDate) -> Self {
        self.with(key, SettingInfo::DateRange { min, max })
    }

    /// Look up an option's declaration
    pub fn get(&self, key: &str) -> Option<&SettingInfo> {
        self.entries.get(key)
    }

    /// All declared options, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared options
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the schema declares no options
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate a caller-supplied map against this schema
    ///
    /// Keys are checked in sorted order, so the reported error is the same for
    /// a given map regardless of hash order.
    ///
    /// # Errors
    /// `UnsupportedSetting` for a key the schema does not declare;
    /// `InvalidSettingValue` for a wrong type or out-of-range value
    pub fn validate(&self, supplied: &SettingsMap) -> Result<ValidatedSettings> {
        let mut sorted: Vec<(&String, &SettingValue)> = supplied.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        for (key, _) in &sorted {
            if !self.entries.contains_key(key.as_str()) {
                return Err(TimbreError::UnsupportedSetting((*key).clone()));
            }
        }

        let mut values = BTreeMap::new();
        for (key, value) in sorted {
            if let Some(info) = self.entries.get(key.as_str()) {
                info.check(key, value)?;
            }
            values.insert(key.clone(), value.clone());
        }

        Ok(ValidatedSettings { values })
    }
}

/// Settings that passed schema validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSettings {
    values: BTreeMap<String, SettingValue>,
}

impl ValidatedSettings {
    /// Settings with no options supplied, equal to validating an empty map
    /// against any schema
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Boolean value for a key
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(SettingValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Integer value for a key
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(SettingValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// String value for a key
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(SettingValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Date value for a key
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        match self.values.get(key) {
            Some(SettingValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Number of supplied options
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no options were supplied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SettingsSchema {
        SettingsSchema::new()
            .with_bool("Verbose")
            .with_int_range("Quality", 0, 10)
            .with_int_set("BitsPerSample", [8, 16, 24])
            .with_text_choices("PeakAnalysis", ["Simple", "Interpolated"])
            .with_text("Label")
            .with_date_range(
                "Released",
                NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2100, 12, 31).unwrap(),
            )
    }

    fn map(entries: &[(&str, SettingValue)]) -> SettingsMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_map_is_valid() {
        let settings = schema().validate(&SettingsMap::new()).unwrap();
        assert!(settings.is_empty());
        assert_eq!(settings, ValidatedSettings::empty());
    }

    #[test]
    fn accepts_declared_values() {
        let supplied = map(&[
            ("Verbose", true.into()),
            ("Quality", 10.into()),
            ("BitsPerSample", 24.into()),
            ("PeakAnalysis", "Interpolated".into()),
            ("Label", "anything".into()),
            ("Released", NaiveDate::from_ymd_opt(2017, 6, 1).unwrap().into()),
        ]);
        let settings = schema().validate(&supplied).unwrap();

        assert_eq!(settings.bool("Verbose"), Some(true));
        assert_eq!(settings.int("Quality"), Some(10));
        assert_eq!(settings.int("BitsPerSample"), Some(24));
        assert_eq!(settings.text("PeakAnalysis"), Some("Interpolated"));
        assert_eq!(settings.text("Label"), Some("anything"));
        assert_eq!(
            settings.date("Released"),
            NaiveDate::from_ymd_opt(2017, 6, 1)
        );
        assert_eq!(settings.len(), 6);
    }

    #[test]
    fn unknown_key_is_unsupported() {
        let err = schema().validate(&map(&[("Foo", "Bar".into())])).unwrap_err();
        assert!(matches!(err, TimbreError::UnsupportedSetting(ref k) if k == "Foo"));
    }

    #[test]
    fn unknown_key_reported_before_bad_value() {
        let supplied = map(&[("Quality", 99.into()), ("Zzz", 1.into())]);
        let err = schema().validate(&supplied).unwrap_err();
        assert!(matches!(err, TimbreError::UnsupportedSetting(_)));
    }

    #[test]
    fn no_silent_coercion() {
        let err = schema()
            .validate(&map(&[("Quality", "5".into())]))
            .unwrap_err();
        assert!(matches!(err, TimbreError::InvalidSettingValue { ref key, .. } if key == "Quality"));

        assert!(schema().validate(&map(&[("Verbose", 1.into())])).is_err());
        assert!(schema().validate(&map(&[("Label", false.into())])).is_err());
    }

    #[test]
    fn range_and_choice_violations() {
        assert!(schema().validate(&map(&[("Quality", 11.into())])).is_err());
        assert!(schema().validate(&map(&[("Quality", (-1).into())])).is_err());
        assert!(schema().validate(&map(&[("BitsPerSample", 12.into())])).is_err());
        assert!(schema()
            .validate(&map(&[("PeakAnalysis", "interpolated".into())]))
            .is_err());
        assert!(schema()
            .validate(&map(&[(
                "Released",
                NaiveDate::from_ymd_opt(1800, 1, 1).unwrap().into()
            )]))
            .is_err());
    }

    #[test]
    fn invalid_value_carries_rendered_value() {
        let err = schema()
            .validate(&map(&[("PeakAnalysis", "Foo".into())]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for setting PeakAnalysis: \"Foo\""
        );
    }

    #[test]
    fn typed_accessors_ignore_other_types() {
        let settings = schema()
            .validate(&map(&[("Quality", 3.into())]))
            .unwrap();
        assert_eq!(settings.text("Quality"), None);
        assert_eq!(settings.bool("Quality"), None);
    }
}
