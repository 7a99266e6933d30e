//! Cascade Scheduler
//!
//! When a variable's value changes after boot, everything that depends on it
//! must re-resolve. The scheduler rebuilds the dependency graph (definitions
//! may have changed), finds the changed node, and runs an option pass for
//! each direct dependent. The branches are independent: they run under
//! `join_all` and a failure in one never aborts its siblings. Each branch
//! recurses into its own dependents, so multi-level chains settle through
//! ordinary call nesting without explicit bookkeeping.
//!
//! While the owning transaction is still Fetching, cascades are skipped
//! entirely; the bulk boot pass already resolves every variable in
//! dependency order.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use tracing::debug;

use super::resolver::OptionResolver;
use super::session::{DashboardSession, TransactionStatus};
use crate::error::Result;
use crate::external::{EventSink, PanelUsageIndex, VariablesChanged};
use crate::graph::build_graph;
use crate::registry::VariableTypeRegistry;
use crate::sync::{self, UrlValue};
use crate::variable::VariableValue;

/// Re-resolves dependents after a value change and publishes the results.
pub struct CascadeScheduler {
    registry: Arc<VariableTypeRegistry>,
    resolver: Arc<OptionResolver>,
    usage: Arc<dyn PanelUsageIndex>,
    events: Arc<dyn EventSink>,
}

impl CascadeScheduler {
    /// Wire a scheduler to its collaborators.
    pub fn new(
        registry: Arc<VariableTypeRegistry>,
        resolver: Arc<OptionResolver>,
        usage: Arc<dyn PanelUsageIndex>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            resolver,
            usage,
            events,
        }
    }

    /// Commit a picked value, then cascade with change notifications.
    pub async fn set_value(
        &self,
        session: &Arc<DashboardSession>,
        id: &str,
        value: VariableValue,
    ) -> Result<()> {
        if self.resolver.set_value(session, id, value).is_none() {
            return Ok(()); // stale scope: silent no-op
        }
        self.variable_updated(session, id, true).await.map(|_| ())
    }

    /// Apply a URL override, then cascade with change notifications.
    pub async fn set_value_from_url(
        &self,
        session: &Arc<DashboardSession>,
        id: &str,
        raw: &UrlValue,
    ) -> Result<()> {
        match self.resolver.set_value_from_url(session, id, raw) {
            // Unchanged values must not cascade, or URL round trips would
            // refresh in a loop.
            None | Some(false) => Ok(()),
            Some(true) => self.variable_updated(session, id, true).await.map(|_| ()),
        }
    }

    /// React to a changed variable: re-resolve its dependents and, when
    /// requested, publish the changed-variables and URL events.
    ///
    /// Returns the ids of every variable the cascade re-resolved.
    pub async fn variable_updated(
        &self,
        session: &Arc<DashboardSession>,
        id: &str,
        emit_change_events: bool,
    ) -> Result<BTreeSet<String>> {
        if session.status() == TransactionStatus::Fetching {
            // Boot path: the bulk pass resolves everything already.
            return Ok(BTreeSet::new());
        }
        let affected = self.cascade_from(session, id.to_string()).await;
        debug!(variable = id, affected = affected.len(), "cascade settled");

        if emit_change_events && session.is_live() {
            let mut changed: Vec<String> = vec![id.to_string()];
            changed.extend(affected.iter().cloned());
            let panel_ids = self.usage.panels_for(&changed);
            self.events.variables_changed(VariablesChanged {
                panel_ids,
                refresh_all: false,
            });
            let params = sync::url_state(session.snapshot().iter());
            self.events
                .variables_changed_in_url(sync::to_query_string(&params));
        }
        Ok(affected)
    }

    /// One cascade level: update every direct dependent of `id`, each branch
    /// recursing into its own dependents. Failed or stale branches stop
    /// where they are.
    fn cascade_from<'a>(
        &'a self,
        session: &'a Arc<DashboardSession>,
        id: String,
    ) -> BoxFuture<'a, BTreeSet<String>> {
        async move {
            let variables = session.snapshot();
            let graph = build_graph(&variables, &self.registry);
            let Some(name) = variables
                .iter()
                .find(|v| v.id == id)
                .map(|v| v.name.clone())
            else {
                return BTreeSet::new();
            };
            let dependent_ids: Vec<String> = graph
                .dependents_of(&name)
                .into_iter()
                .filter_map(|dep_name| {
                    variables
                        .iter()
                        .find(|v| v.name == dep_name)
                        .map(|v| v.id.clone())
                })
                .collect();

            let branches = dependent_ids.into_iter().map(|dep_id| async move {
                let outcome = self.resolver.update_options(session, &dep_id, None).await;
                let mut affected = BTreeSet::new();
                if outcome.resolved() {
                    affected.extend(self.cascade_from(session, dep_id.clone()).await);
                    affected.insert(dep_id);
                }
                affected
            });

            let mut affected = BTreeSet::new();
            for branch in join_all(branches).await {
                affected.extend(branch);
            }
            affected
        }
        .boxed()
    }
}
