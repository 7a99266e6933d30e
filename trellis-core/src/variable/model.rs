//! The Variable Record
//!
//! A [`Variable`] is one named parameter of a dashboard. Its `kind` selects
//! the registered behavior (how options are fetched, what it can depend on);
//! everything else here is plain data the engine moves through the
//! NotStarted → Fetching → Done/Error lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{VariableOption, VariableValue};

/// The closed set of variable kinds.
///
/// Behavior for each kind lives in [`crate::kinds`]; adding a kind means
/// adding a registry entry, never an implicit fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Hidden, read-only variables seeded by the engine itself.
    System,
    /// Options come from the option provider (a query backend).
    Query,
    /// Options parsed from a comma-separated definition.
    Custom,
    /// A single fixed value.
    Constant,
    /// Free-form text entered by the user.
    TextBox,
    /// A list of interval durations.
    Interval,
    /// Options are the data sources matching a filter.
    DataSource,
}

impl VariableKind {
    /// Stable lowercase tag, as used in save models and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::System => "system",
            VariableKind::Query => "query",
            VariableKind::Custom => "custom",
            VariableKind::Constant => "constant",
            VariableKind::TextBox => "textbox",
            VariableKind::Interval => "interval",
            VariableKind::DataSource => "datasource",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a variable inside a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadingState {
    /// Created but not yet picked up by the resolver.
    NotStarted,
    /// An option fetch or selection pass is in flight.
    Fetching,
    /// Resolved; value and options are current.
    Done,
    /// Resolution failed; see [`Variable::error`].
    Error,
}

impl LoadingState {
    /// Whether the state is terminal (dependents may proceed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadingState::Done | LoadingState::Error)
    }
}

/// When a variable re-fetches its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshPolicy {
    /// Options are fetched once (or parsed from the definition) and kept.
    #[default]
    Never,
    /// Re-fetch on every dashboard load.
    OnLoad,
    /// Re-fetch whenever the dashboard time window changes.
    OnTimeRangeChange,
}

/// One template variable of a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Unique id within the owning scope.
    pub id: String,
    /// Unique name within the owning scope; the token used in `$name`
    /// references.
    pub name: String,
    /// Which registered behavior drives this variable.
    #[serde(rename = "type")]
    pub kind: VariableKind,
    /// Optional display label for pickers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kind-specific definition text (backend query, comma list, ...).
    #[serde(default)]
    pub query: String,
    /// The current selection.
    #[serde(default = "VariableValue::none")]
    pub current: VariableValue,
    /// Selectable options, in provider order.
    #[serde(default)]
    pub options: Vec<VariableOption>,
    /// Lifecycle state; only the operation currently resolving this variable
    /// may move it.
    #[serde(skip, default = "default_state")]
    pub state: LoadingState,
    /// Failure message when `state` is `Error`.
    #[serde(skip)]
    pub error: Option<String>,
    /// When options are re-fetched.
    #[serde(default)]
    pub refresh: RefreshPolicy,
    /// Whether multiple options may be selected at once.
    #[serde(default)]
    pub multi: bool,
    /// Whether the synthetic "All" option is offered.
    #[serde(default)]
    pub include_all: bool,
    /// Hidden variables are excluded from pickers and URL sync.
    #[serde(default)]
    pub hide: bool,
    /// Opt-out of URL synchronization even when visible.
    #[serde(default)]
    pub skip_url_sync: bool,
    /// Declaration position; system variables sit at negative indices so
    /// they sort before every user variable.
    #[serde(default)]
    pub index: i64,
}

fn default_state() -> LoadingState {
    LoadingState::NotStarted
}

impl Variable {
    /// Build a variable of the given kind with empty value and options.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            kind,
            label: None,
            query: String::new(),
            current: VariableValue::none(),
            options: Vec::new(),
            state: LoadingState::NotStarted,
            error: None,
            refresh: RefreshPolicy::default(),
            multi: false,
            include_all: false,
            hide: false,
            skip_url_sync: false,
            index: 0,
        }
    }

    /// A provider-backed query variable that re-fetches on load.
    pub fn query(name: impl Into<String>, definition: impl Into<String>) -> Self {
        let mut v = Self::new(name, VariableKind::Query);
        v.query = definition.into();
        v.refresh = RefreshPolicy::OnLoad;
        v
    }

    /// A custom variable with a comma-separated option list.
    pub fn custom(name: impl Into<String>, definition: impl Into<String>) -> Self {
        let mut v = Self::new(name, VariableKind::Custom);
        v.query = definition.into();
        v
    }

    /// A constant variable with a single fixed value.
    pub fn constant(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut v = Self::new(name, VariableKind::Constant);
        v.query = value.into();
        v.hide = true;
        v
    }

    /// A free-form text variable with a default value.
    pub fn text_box(name: impl Into<String>, default: impl Into<String>) -> Self {
        let mut v = Self::new(name, VariableKind::TextBox);
        v.query = default.into();
        v
    }

    /// An interval variable over a comma-separated duration list.
    pub fn interval(name: impl Into<String>, durations: impl Into<String>) -> Self {
        let mut v = Self::new(name, VariableKind::Interval);
        v.query = durations.into();
        v
    }

    /// A hidden, read-only system variable with a fixed value.
    pub fn system(name: impl Into<String>, value: impl Into<String>, index: i64) -> Self {
        let mut v = Self::new(name, VariableKind::System);
        let value = value.into();
        v.current = VariableValue::Single(value.clone());
        v.options = vec![VariableOption::plain(value)];
        v.hide = true;
        v.skip_url_sync = true;
        v.index = index;
        v
    }

    /// Mark this variable multi-select.
    pub fn with_multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Offer the synthetic "All" option.
    pub fn with_include_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    /// Set the refresh policy.
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    /// Whether this variable participates in URL sync.
    pub fn syncs_to_url(&self) -> bool {
        !self.hide && !self.skip_url_sync
    }

    /// Whether this variable re-fetches when the time window changes.
    pub fn refreshes_on_time_range(&self) -> bool {
        self.refresh == RefreshPolicy::OnTimeRangeChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_variable_starts_not_started() {
        let v = Variable::query("region", "regions()");
        assert_eq!(v.state, LoadingState::NotStarted);
        assert_eq!(v.refresh, RefreshPolicy::OnLoad);
        assert!(v.current.is_empty());
    }

    #[test]
    fn system_variable_is_hidden_and_url_exempt() {
        let v = Variable::system("__org", "1", -2);
        assert!(v.hide);
        assert!(v.skip_url_sync);
        assert!(!v.syncs_to_url());
        assert_eq!(v.index, -2);
        assert_eq!(v.current, VariableValue::Single("1".into()));
    }

    #[test]
    fn terminal_states() {
        assert!(!LoadingState::NotStarted.is_terminal());
        assert!(!LoadingState::Fetching.is_terminal());
        assert!(LoadingState::Done.is_terminal());
        assert!(LoadingState::Error.is_terminal());
    }

    #[test]
    fn save_model_uses_type_tag() {
        let v = Variable::custom("env", "dev,prod");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "custom");
        assert_eq!(json["name"], "env");
    }
}
