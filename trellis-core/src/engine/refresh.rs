//! Refresh-Set Optimizer
//!
//! When the dashboard time window moves, only variables with the
//! OnTimeRangeChange policy need fresh options, and not even all of those.
//! A tagged variable whose dependents will be cascaded anyway does not need
//! its dependents refreshed directly too. The optimizer walks the graph once
//! and returns the minimal set of variables to refresh; the cascade after
//! each direct refresh picks up the rest.
//!
//! # Walk rules
//!
//! Variables are visited in declaration order, skipping already-visited
//! names:
//!
//! - A tagged variable enters the result and marks every transitive
//!   dependent visited, tagged or not, since the cascade reaches them.
//! - An untagged variable with dependents is walked through (without being
//!   added): each tagged descendant found enters the result and the walk
//!   stops below it, since its own cascade covers the rest.
//!
//! The legacy mode skips the optimization and refreshes every tagged
//! variable unconditionally, accepting the duplicate work.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use super::cascade::CascadeScheduler;
use super::resolver::OptionResolver;
use super::session::DashboardSession;
use crate::error::Result;
use crate::external::{EventSink, TimeRange};
use crate::graph::{build_graph, DependencyGraph};
use crate::registry::VariableTypeRegistry;
use crate::variable::Variable;

/// How a time-range change selects variables to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Refresh the minimal set; cascade covers dependents.
    #[default]
    Optimized,
    /// Refresh every tagged variable unconditionally (compatibility mode).
    Legacy,
}

/// Compute the minimal direct-refresh set for a time-range change.
///
/// `variables` must be in declaration order. Returns variable names in walk
/// order.
pub fn refresh_set<'a>(graph: &'a DependencyGraph, variables: &'a [Variable]) -> Vec<&'a str> {
    let tagged: HashSet<&str> = variables
        .iter()
        .filter(|v| v.refreshes_on_time_range())
        .map(|v| v.name.as_str())
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut result: Vec<&'a str> = Vec::new();

    for variable in variables {
        let name = variable.name.as_str();
        if !visited.insert(name) {
            continue;
        }
        if tagged.contains(name) {
            result.push(name);
            for dependent in graph.transitive_dependents_of(name) {
                visited.insert(dependent);
            }
        } else if graph.has_dependents(name) {
            // Walk through untagged nodes looking for tagged descendants.
            let mut queue: Vec<&str> = graph.dependents_of(name);
            while let Some(descendant) = queue.pop() {
                if !visited.insert(descendant) {
                    continue;
                }
                if tagged.contains(descendant) {
                    result.push(
                        variables
                            .iter()
                            .find(|v| v.name == descendant)
                            .map(|v| v.name.as_str())
                            .unwrap_or(descendant),
                    );
                    // Its cascade covers everything below it.
                    for dependent in graph.transitive_dependents_of(descendant) {
                        visited.insert(dependent);
                    }
                } else {
                    queue.extend(graph.dependents_of(descendant));
                }
            }
        }
    }
    result
}

/// Executes time-range refreshes over the minimal (or legacy) set.
pub struct RefreshSetOptimizer {
    registry: Arc<VariableTypeRegistry>,
    resolver: Arc<OptionResolver>,
    cascade: Arc<CascadeScheduler>,
    events: Arc<dyn EventSink>,
}

impl RefreshSetOptimizer {
    /// Wire the optimizer to its collaborators.
    pub fn new(
        registry: Arc<VariableTypeRegistry>,
        resolver: Arc<OptionResolver>,
        cascade: Arc<CascadeScheduler>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            resolver,
            cascade,
            events,
        }
    }

    /// Apply a time-range change: refresh the selected set, cascade each
    /// entry's dependents, and report completion.
    ///
    /// Entries run independently; one failure is recorded on its variable
    /// and neither blocks nor aborts the others.
    pub async fn on_time_range_changed(
        &self,
        session: &Arc<DashboardSession>,
        range: TimeRange,
        mode: RefreshMode,
    ) -> Result<()> {
        if !session.is_live() {
            return Ok(());
        }
        session.set_time_range(range);

        let variables = session.snapshot();
        let graph = build_graph(&variables, &self.registry);
        let target_names: Vec<&str> = match mode {
            RefreshMode::Optimized => refresh_set(&graph, &variables),
            RefreshMode::Legacy => variables
                .iter()
                .filter(|v| v.refreshes_on_time_range())
                .map(|v| v.name.as_str())
                .collect(),
        };
        let targets: Vec<String> = target_names
            .into_iter()
            .filter_map(|name| variables.iter().find(|v| v.name == name))
            .map(|v| v.id.clone())
            .collect();
        debug!(?mode, targets = targets.len(), "time range changed");

        let refreshes = targets.iter().map(|id| async move {
            let prior_options = session.variable(id).map(|v| v.options).unwrap_or_default();
            let outcome = self.resolver.update_options(session, id, None).await;
            if !outcome.resolved() {
                return None;
            }
            let options_changed = session
                .variable(id)
                .map(|v| v.options != prior_options)
                .unwrap_or(false);
            // Dependents refresh through the ordinary cascade.
            let _ = self.cascade.variable_updated(session, id, false).await;
            Some((id.clone(), options_changed))
        });

        let mut completed: Vec<String> = Vec::new();
        let mut any_options_changed = false;
        for refresh in join_all(refreshes).await.into_iter().flatten() {
            any_options_changed |= refresh.1;
            completed.push(refresh.0);
        }

        if session.is_live() {
            if any_options_changed {
                self.events.variables_changed(crate::external::VariablesChanged {
                    panel_ids: Vec::new(),
                    refresh_all: true,
                });
            }
            self.events.time_range_refresh_completed(completed);
        }
        Ok(())
    }
}
