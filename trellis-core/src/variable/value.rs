//! Values and Options
//!
//! A variable's current value is either a single string or an ordered
//! collection of strings. Options pair a display text with a value and carry
//! a selected flag so pickers can render without consulting the engine.

use serde::{Deserialize, Serialize};

/// Sentinel value meaning "every available option".
///
/// Shared by URL encoding and decoding; it is the value of the synthetic
/// "All" option prepended to include-all variables.
pub const ALL_VALUE: &str = "$__all";

/// Display text of the synthetic "All" option.
pub const ALL_VARIABLE_TEXT: &str = "All";

/// One selectable option of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOption {
    /// Text shown in pickers.
    pub text: String,
    /// Value substituted into queries.
    pub value: String,
    /// Whether this option is part of the current selection.
    #[serde(default)]
    pub selected: bool,
}

impl VariableOption {
    /// Build an option whose text and value are the same string.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: value.clone(),
            value,
            selected: false,
        }
    }

    /// Build an option with distinct text and value.
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            selected: false,
        }
    }

    /// The synthetic "All" option.
    pub fn all() -> Self {
        Self {
            text: ALL_VARIABLE_TEXT.to_string(),
            value: ALL_VALUE.to_string(),
            selected: false,
        }
    }
}

/// The current value of a variable: a scalar or an ordered collection.
///
/// Equality is normalized: `Multi(["a"])` compares equal to `Single("a")`.
/// URL decoding and cascade-change detection rely on this to avoid refresh
/// loops when a multi-select value round-trips through a single parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// A single selected value.
    Single(String),
    /// An ordered collection of selected values.
    Multi(Vec<String>),
}

impl VariableValue {
    /// Empty value for variables that have not resolved yet.
    pub fn none() -> Self {
        VariableValue::Single(String::new())
    }

    /// The selected values in order, regardless of representation.
    pub fn values(&self) -> Vec<&str> {
        match self {
            VariableValue::Single(v) => vec![v.as_str()],
            VariableValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Whether the given raw value is part of the selection.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            VariableValue::Single(v) => v == value,
            VariableValue::Multi(vs) => vs.iter().any(|v| v == value),
        }
    }

    /// Whether this is the "match all" sentinel selection.
    pub fn is_all(&self) -> bool {
        self.contains(ALL_VALUE)
    }

    /// Whether no value is selected at all.
    pub fn is_empty(&self) -> bool {
        match self {
            VariableValue::Single(v) => v.is_empty(),
            VariableValue::Multi(vs) => vs.is_empty(),
        }
    }
}

impl PartialEq for VariableValue {
    fn eq(&self, other: &Self) -> bool {
        // Normalized: a one-element collection equals its scalar equivalent.
        self.values() == other.values()
    }
}

impl Eq for VariableValue {}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for VariableValue {
    fn from(values: Vec<&str>) -> Self {
        VariableValue::Multi(values.into_iter().map(String::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_and_one_element_multi_compare_equal() {
        let single = VariableValue::Single("a".into());
        let multi = VariableValue::Multi(vec!["a".into()]);
        assert_eq!(single, multi);
        assert_eq!(multi, single);
    }

    #[test]
    fn multi_equality_is_order_sensitive() {
        let ab: VariableValue = vec!["a", "b"].into();
        let ba: VariableValue = vec!["b", "a"].into();
        assert_ne!(ab, ba);
    }

    #[test]
    fn all_sentinel_is_detected_in_both_shapes() {
        assert!(VariableValue::Single(ALL_VALUE.into()).is_all());
        assert!(VariableValue::Multi(vec![ALL_VALUE.into()]).is_all());
        assert!(!VariableValue::Single("a".into()).is_all());
    }

    #[test]
    fn plain_option_mirrors_value_into_text() {
        let opt = VariableOption::plain("prod");
        assert_eq!(opt.text, "prod");
        assert_eq!(opt.value, "prod");
        assert!(!opt.selected);
    }
}
