//! Option Resolver
//!
//! Drives one variable through its state transitions. The resolution policy
//! applied after a variable's dependencies are terminal:
//!
//! 1. A URL override for its name applies via `set_value_from_url`, and the
//!    variable is done.
//! 2. A refresh policy of OnLoad/OnTimeRangeChange runs an option pass.
//! 3. A kind that needs a default-selection pass even with static options
//!    runs an option pass.
//! 4. Otherwise the variable is marked Done directly, so downstream
//!    consumers see the same terminal state on every path.
//!
//! An option pass races the kind's fetch against session cancellation,
//! validates the selection against the fresh options, and commits options,
//! current value, and terminal state in a single store write. Provider
//! failures stay local: the variable enters Error with a message, a user
//! notification is raised, and no error propagates into sibling resolution.
//!
//! Overlapping resolutions of the same variable are serialized by the
//! session's per-variable guard.

use std::sync::Arc;

use tracing::{debug, warn};

use super::session::DashboardSession;
use crate::external::{EventSink, OptionProvider};
use crate::registry::{UpdateContext, VariableTypeRegistry};
use crate::sync::{self, UrlQueryMap, UrlValue};
use crate::variable::{LoadingState, RefreshPolicy, Variable, VariableOption, VariableValue};

/// What an option pass did to the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Options refreshed; the current value survived.
    Unchanged,
    /// Options refreshed and the current value moved.
    Changed,
    /// The fetch failed; the variable is in the Error state.
    Failed,
    /// The owning session was superseded mid-flight; nothing was written.
    Stale,
}

impl UpdateOutcome {
    /// Whether the pass left the variable usable (Done, not Error/stale).
    pub fn resolved(&self) -> bool {
        matches!(self, UpdateOutcome::Unchanged | UpdateOutcome::Changed)
    }
}

/// Resolves variables by invoking their kind's capabilities.
pub struct OptionResolver {
    registry: Arc<VariableTypeRegistry>,
    provider: Arc<dyn OptionProvider>,
    events: Arc<dyn EventSink>,
}

impl OptionResolver {
    /// Wire a resolver to its collaborators.
    pub fn new(
        registry: Arc<VariableTypeRegistry>,
        provider: Arc<dyn OptionProvider>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            provider,
            events,
        }
    }

    /// Apply the resolution policy to one variable after waiting for its
    /// declared dependencies to leave NotStarted/Fetching.
    pub async fn process_variable(
        &self,
        session: &DashboardSession,
        id: &str,
        dependency_ids: &[String],
        overrides: &UrlQueryMap,
    ) {
        for dep in dependency_ids {
            session.wait_for_terminal(dep).await;
        }
        let Some(variable) = session.variable(id) else {
            return;
        };

        if let Some(raw) = sync::override_for(overrides, &variable.name) {
            self.set_value_from_url(session, id, raw);
            return;
        }
        let needs_refresh = matches!(
            variable.refresh,
            RefreshPolicy::OnLoad | RefreshPolicy::OnTimeRangeChange
        );
        if needs_refresh || self.registry.get(variable.kind).needs_selection_pass(&variable) {
            self.update_options(session, id, None).await;
        } else {
            session.set_state(id, LoadingState::Done);
        }
    }

    /// Run one option pass: fetch, validate selection, commit.
    pub async fn update_options(
        &self,
        session: &DashboardSession,
        id: &str,
        search: Option<&str>,
    ) -> UpdateOutcome {
        let Some(guard) = session.guard(id) else {
            return UpdateOutcome::Stale;
        };
        let _in_flight = guard.lock().await;

        let Some(variable) = session.variable(id) else {
            return UpdateOutcome::Stale;
        };
        if !session.set_state(id, LoadingState::Fetching) {
            return UpdateOutcome::Stale;
        }
        debug!(variable = %variable.name, kind = %variable.kind, "updating options");

        let variable_type = self.registry.get(variable.kind);
        let ctx = UpdateContext {
            provider: self.provider.as_ref(),
            time_range: session.time_range(),
            search,
        };
        let fetched = tokio::select! {
            result = variable_type.fetch_options(&variable, ctx) => result,
            _ = session.cancelled() => return UpdateOutcome::Stale,
        };

        match fetched {
            Ok(options) => self.commit_options(session, id, &variable, options),
            Err(err) => {
                let message = err.to_string();
                warn!(variable = %variable.name, error = %message, "option fetch failed");
                let recorded = session
                    .mutate_variable(id, |v| {
                        v.state = LoadingState::Error;
                        v.error = Some(message.clone());
                    })
                    .is_some();
                if recorded {
                    self.events.notify_error(&variable.name, &message);
                    UpdateOutcome::Failed
                } else {
                    UpdateOutcome::Stale
                }
            }
        }
    }

    /// Validate the prior selection against fresh options and commit
    /// everything in one store write.
    fn commit_options(
        &self,
        session: &DashboardSession,
        id: &str,
        prior: &Variable,
        mut options: Vec<VariableOption>,
    ) -> UpdateOutcome {
        if prior.include_all {
            options.insert(0, VariableOption::all());
        }

        let retained: Vec<String> = prior
            .current
            .values()
            .into_iter()
            .filter(|v| !v.is_empty())
            .filter(|v| options.iter().any(|o| o.value == *v))
            .map(String::from)
            .collect();

        let new_current = if !retained.is_empty() {
            if prior.multi {
                VariableValue::Multi(retained)
            } else {
                VariableValue::Single(retained.into_iter().next().unwrap_or_default())
            }
        } else {
            // Default selection: the first option, which is "All" when the
            // variable includes it.
            let first = options.first().map(|o| o.value.clone()).unwrap_or_default();
            if prior.multi {
                VariableValue::Multi(if first.is_empty() { Vec::new() } else { vec![first] })
            } else {
                VariableValue::Single(first)
            }
        };

        for option in &mut options {
            option.selected = new_current.contains(&option.value);
        }

        let changed = prior.current != new_current;
        let committed = session
            .mutate_variable(id, |v| {
                v.options = options;
                v.current = new_current;
                v.state = LoadingState::Done;
                v.error = None;
            })
            .is_some();
        if !committed {
            return UpdateOutcome::Stale;
        }
        if changed {
            UpdateOutcome::Changed
        } else {
            UpdateOutcome::Unchanged
        }
    }

    /// Commit a picked value. Returns whether the value changed, or `None`
    /// when the session is stale or the id unknown.
    pub fn set_value(
        &self,
        session: &DashboardSession,
        id: &str,
        value: VariableValue,
    ) -> Option<bool> {
        session.mutate_variable(id, |v| {
            let changed = v.current != value;
            v.current = value;
            for option in &mut v.options {
                option.selected = v.current.contains(&option.value);
            }
            v.state = LoadingState::Done;
            v.error = None;
            changed
        })
    }

    /// Apply a URL override through the kind's capability, in one state
    /// update. Returns whether the value changed.
    pub fn set_value_from_url(
        &self,
        session: &DashboardSession,
        id: &str,
        raw: &UrlValue,
    ) -> Option<bool> {
        let kind = session.variable(id)?.kind;
        let variable_type = self.registry.get(kind);
        session.mutate_variable(id, |v| {
            let changed = variable_type.set_value_from_url(v, raw);
            v.state = LoadingState::Done;
            v.error = None;
            changed
        })
    }
}
