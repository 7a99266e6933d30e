//! URL Synchronization
//!
//! Bidirectional mapping between variable values and URL query parameters.
//!
//! # Contract
//!
//! - One parameter per non-hidden, sync-eligible variable, named
//!   `var-<name>`.
//! - A single value encodes as itself; the "match all" selection encodes as
//!   the shared `$__all` sentinel; a multi-value selection repeats the
//!   parameter.
//! - Decoding matches the raw value against existing option text or value.
//!   An unmatched raw on a multi-select variable synthesizes an ad hoc
//!   option, so URLs can carry values no fetch ever produced.
//! - A one-element collection and its scalar equivalent compare equal
//!   everywhere, which keeps encode/decode round trips from looking like
//!   changes and re-triggering refreshes.

use indexmap::IndexMap;

use crate::variable::{Variable, VariableOption, VariableValue, ALL_VALUE, ALL_VARIABLE_TEXT};

/// Fixed prefix of variable query parameters.
pub const URL_VAR_PREFIX: &str = "var-";

/// A raw query-parameter value: one occurrence or several.
#[derive(Debug, Clone)]
pub enum UrlValue {
    /// The parameter appeared once.
    Single(String),
    /// The parameter was repeated.
    Many(Vec<String>),
}

impl UrlValue {
    /// The raw values in order, regardless of representation.
    pub fn values(&self) -> Vec<&str> {
        match self {
            UrlValue::Single(v) => vec![v.as_str()],
            UrlValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl PartialEq for UrlValue {
    fn eq(&self, other: &Self) -> bool {
        // Same normalization as VariableValue.
        self.values() == other.values()
    }
}

impl Eq for UrlValue {}

impl From<&str> for UrlValue {
    fn from(value: &str) -> Self {
        UrlValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for UrlValue {
    fn from(values: Vec<&str>) -> Self {
        UrlValue::Many(values.into_iter().map(String::from).collect())
    }
}

/// Parsed query parameters, keyed by full parameter name (`var-` included).
pub type UrlQueryMap = IndexMap<String, UrlValue>;

/// The query-parameter name for a variable.
pub fn param_name(variable_name: &str) -> String {
    format!("{URL_VAR_PREFIX}{variable_name}")
}

/// Look up the override for a variable, if the map carries one.
pub fn override_for<'a>(overrides: &'a UrlQueryMap, variable_name: &str) -> Option<&'a UrlValue> {
    overrides.get(&param_name(variable_name))
}

/// Encode a variable's current value for the URL.
pub fn value_for_url(variable: &Variable) -> UrlValue {
    if variable.current.is_all() {
        return UrlValue::Single(ALL_VALUE.to_string());
    }
    match &variable.current {
        VariableValue::Single(v) => UrlValue::Single(v.clone()),
        VariableValue::Multi(vs) => UrlValue::Many(vs.clone()),
    }
}

/// Apply a raw URL value to a variable in one mutation.
///
/// Raw values are resolved against option text first, option value second;
/// unmatched raws on multi-select variables synthesize ad hoc options.
/// Returns whether the current value actually changed (normalized compare).
pub fn apply_url_value(variable: &mut Variable, raw: &UrlValue) -> bool {
    let mut resolved: Vec<String> = Vec::new();
    for raw_value in raw.values() {
        let matched = variable
            .options
            .iter()
            .find(|o| o.text == raw_value || o.value == raw_value)
            .map(|o| o.value.clone());
        match matched {
            Some(value) => resolved.push(value),
            None if raw_value == ALL_VALUE || raw_value == ALL_VARIABLE_TEXT => {
                resolved.push(ALL_VALUE.to_string());
            }
            None => {
                if variable.multi {
                    variable.options.push(VariableOption::plain(raw_value));
                }
                resolved.push(raw_value.to_string());
            }
        }
    }

    let new_value = if variable.multi {
        VariableValue::Multi(resolved)
    } else {
        VariableValue::Single(resolved.into_iter().next().unwrap_or_default())
    };

    let changed = variable.current != new_value;
    variable.current = new_value;
    for option in &mut variable.options {
        option.selected = variable.current.contains(&option.value);
    }
    changed
}

/// Collect the URL parameters for every sync-eligible variable, in
/// declaration order.
pub fn url_state<'a, I>(variables: I) -> Vec<(String, UrlValue)>
where
    I: IntoIterator<Item = &'a Variable>,
{
    variables
        .into_iter()
        .filter(|v| v.syncs_to_url())
        .map(|v| (param_name(&v.name), value_for_url(v)))
        .collect()
}

/// Render parameters as a query-string fragment (repeated keys for arrays).
pub fn to_query_string(params: &[(String, UrlValue)]) -> String {
    let mut parts = Vec::new();
    for (key, value) in params {
        for v in value.values() {
            parts.push(format!("{key}={v}"));
        }
    }
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_round_trips() {
        let mut v = Variable::custom("env", "dev,prod");
        v.options = vec![VariableOption::plain("dev"), VariableOption::plain("prod")];
        v.current = VariableValue::Single("prod".into());

        let encoded = value_for_url(&v);
        assert_eq!(encoded, UrlValue::Single("prod".into()));

        v.current = VariableValue::Single("dev".into());
        apply_url_value(&mut v, &encoded);
        assert_eq!(v.current, VariableValue::Single("prod".into()));
    }

    #[test]
    fn multi_value_round_trips_in_order() {
        let mut v = Variable::custom("env", "a,b,c").with_multi();
        v.options = vec![
            VariableOption::plain("a"),
            VariableOption::plain("b"),
            VariableOption::plain("c"),
        ];
        v.current = VariableValue::Multi(vec!["b".into(), "a".into()]);

        let encoded = value_for_url(&v);
        assert_eq!(encoded, UrlValue::Many(vec!["b".into(), "a".into()]));

        v.current = VariableValue::Multi(vec!["c".into()]);
        apply_url_value(&mut v, &encoded);
        assert_eq!(v.current, VariableValue::Multi(vec!["b".into(), "a".into()]));
    }

    #[test]
    fn all_selection_encodes_as_the_sentinel() {
        let mut v = Variable::custom("env", "a,b").with_multi().with_include_all();
        v.current = VariableValue::Multi(vec![ALL_VALUE.into()]);
        assert_eq!(value_for_url(&v), UrlValue::Single(ALL_VALUE.into()));
    }

    #[test]
    fn raw_matches_option_text_before_value() {
        let mut v = Variable::custom("env", "Production : prod");
        v.options = vec![VariableOption::new("Production", "prod")];
        apply_url_value(&mut v, &"Production".into());
        assert_eq!(v.current, VariableValue::Single("prod".into()));
        assert!(v.options[0].selected);
    }

    #[test]
    fn unmatched_raw_on_multi_select_synthesizes_an_option() {
        let mut v = Variable::custom("env", "a,b").with_multi();
        v.options = vec![VariableOption::plain("a"), VariableOption::plain("b")];
        let changed = apply_url_value(&mut v, &vec!["a", "adhoc"].into());
        assert!(changed);
        assert_eq!(v.current, VariableValue::Multi(vec!["a".into(), "adhoc".into()]));
        assert!(v.options.iter().any(|o| o.value == "adhoc" && o.selected));
    }

    #[test]
    fn scalar_and_one_element_collection_do_not_count_as_a_change() {
        let mut v = Variable::custom("env", "a,b").with_multi();
        v.options = vec![VariableOption::plain("a"), VariableOption::plain("b")];
        v.current = VariableValue::Single("a".into());
        // Same selection arriving as a repeated-parameter collection.
        let changed = apply_url_value(&mut v, &vec!["a"].into());
        assert!(!changed);
    }

    #[test]
    fn url_state_skips_hidden_and_opted_out_variables() {
        let mut visible = Variable::custom("env", "a");
        visible.current = VariableValue::Single("a".into());
        let hidden = Variable::system("__org", "1", -2);
        let mut opted_out = Variable::custom("internal", "x");
        opted_out.skip_url_sync = true;

        let params = url_state([&visible, &hidden, &opted_out]);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0, "var-env");
    }

    #[test]
    fn query_string_repeats_multi_params() {
        let params = vec![
            ("var-a".to_string(), UrlValue::Single("1".into())),
            ("var-b".to_string(), UrlValue::Many(vec!["x".into(), "y".into()])),
        ];
        assert_eq!(to_query_string(&params), "var-a=1&var-b=x&var-b=y");
    }
}
