//! External Collaborators
//!
//! The engine does not talk to query backends, panels, or the browser
//! directly. Everything it needs from the outside world comes in through the
//! traits in this module:
//!
//! - [`OptionProvider`]: fetches the option list for a query definition.
//! - [`PanelUsageIndex`]: maps changed variables to the panels that use them.
//! - [`EventSink`]: fire-and-forget notifications (no acknowledgement).
//!
//! All notifications are best-effort; the engine never waits on a sink.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::variable::VariableOption;

/// The active dashboard time window.
///
/// Values are kept as raw range expressions ("now-6h", "now", absolute
/// timestamps); the engine only passes them through to the provider and
/// compares them for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the window.
    pub from: String,
    /// End of the window.
    pub to: String,
}

impl TimeRange {
    /// Build a range from raw expressions.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::new("now-6h", "now")
    }
}

/// Dashboard-level context used when a transaction initializes.
///
/// Supplies the values backing the three fixed system variables and the
/// initial time window.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    /// Stable dashboard identifier (the transaction scope key is derived
    /// from it by the caller).
    pub uid: String,
    /// Human-readable dashboard title, exposed as `__dashboard`.
    pub title: String,
    /// Owning organization, exposed as `__org`.
    pub org_id: i64,
    /// Login of the viewing user, exposed as `__user`.
    pub user: String,
    /// Initial time window for the session.
    pub time_range: TimeRange,
}

/// Fetches options for provider-backed variable kinds.
///
/// Implementations talk to whatever query backend the dashboard is wired to.
/// The engine may call this repeatedly for the same definition (cascade,
/// time-range refresh); implementations must tolerate that.
#[async_trait]
pub trait OptionProvider: Send + Sync {
    /// Evaluate `query` against the given time window and return the
    /// resulting options in backend order.
    async fn fetch_options(
        &self,
        query: &str,
        time_range: &TimeRange,
        search: Option<&str>,
    ) -> Result<Vec<VariableOption>>;
}

/// Maps changed variable ids to the panels consuming them.
pub trait PanelUsageIndex: Send + Sync {
    /// Return the ids of every panel that reads at least one of the given
    /// variables.
    fn panels_for(&self, variable_ids: &[String]) -> Vec<u64>;
}

/// Payload of the variables-changed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablesChanged {
    /// Panels that consume at least one affected variable.
    pub panel_ids: Vec<u64>,
    /// Whether consumers should refresh everything rather than the listed
    /// panels only.
    pub refresh_all: bool,
}

/// Receives the engine's fire-and-forget notifications.
///
/// Default implementations drop everything, so sinks only override what they
/// care about.
pub trait EventSink: Send + Sync {
    /// One or more variable values changed; affected panels should re-query.
    fn variables_changed(&self, _event: VariablesChanged) {}

    /// The URL-visible variable state changed; `query` is the encoded
    /// query-string fragment to push.
    fn variables_changed_in_url(&self, _query: String) {}

    /// A time-range refresh pass finished for the given variable ids.
    fn time_range_refresh_completed(&self, _variable_ids: Vec<String>) {}

    /// A per-variable failure that should reach the user as a notification.
    fn notify_error(&self, _variable: &str, _message: &str) {}
}

/// Sink that ignores every notification.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {}

/// Usage index for dashboards with no panel wiring (tests, previews).
#[derive(Debug, Default)]
pub struct EmptyUsageIndex;

impl PanelUsageIndex for EmptyUsageIndex {
    fn panels_for(&self, _variable_ids: &[String]) -> Vec<u64> {
        Vec::new()
    }
}
