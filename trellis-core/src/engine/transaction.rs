//! Transaction Coordinator
//!
//! Owns the lifecycle of one resolution pass per dashboard-instance key and
//! wires the engine's components together. A transaction moves
//! NotStarted → Fetching → Completed; starting a transaction for a new scope
//! while another is still Fetching cancels the old one (best-effort abort of
//! its outstanding fetches, store wiped) before the new scope is populated.
//!
//! `init` seeds the three system variables at fixed negative indices, then
//! the user-declared variables in declaration order, all NotStarted.
//! `process_all` resolves every variable per the resolution policy, with
//! dependency waits supplied by the freshly built graph.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::cascade::CascadeScheduler;
use super::refresh::{RefreshMode, RefreshSetOptimizer};
use super::resolver::OptionResolver;
use super::session::{DashboardSession, TransactionStatus};
use crate::error::{Result, VariableError};
use crate::external::{DashboardContext, EventSink, OptionProvider, PanelUsageIndex, TimeRange};
use crate::graph::build_graph;
use crate::kinds::system_variables;
use crate::registry::VariableTypeRegistry;
use crate::sync::UrlQueryMap;
use crate::variable::{LoadingState, Variable, VariableKind, VariableValue};

/// The engine's front door: transactions, value changes, time-range
/// refreshes, and teardown.
pub struct TransactionCoordinator {
    registry: Arc<VariableTypeRegistry>,
    resolver: Arc<OptionResolver>,
    cascade: Arc<CascadeScheduler>,
    refresh: Arc<RefreshSetOptimizer>,
    active: Mutex<Option<Arc<DashboardSession>>>,
}

impl TransactionCoordinator {
    /// Build a coordinator over the default kind registry.
    pub fn new(
        provider: Arc<dyn OptionProvider>,
        usage: Arc<dyn PanelUsageIndex>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self::with_registry(Arc::new(VariableTypeRegistry::default()), provider, usage, events)
    }

    /// Build a coordinator over a custom registry (tests, plugins).
    pub fn with_registry(
        registry: Arc<VariableTypeRegistry>,
        provider: Arc<dyn OptionProvider>,
        usage: Arc<dyn PanelUsageIndex>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let resolver = Arc::new(OptionResolver::new(
            Arc::clone(&registry),
            provider,
            Arc::clone(&events),
        ));
        let cascade = Arc::new(CascadeScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&resolver),
            usage,
            Arc::clone(&events),
        ));
        let refresh = Arc::new(RefreshSetOptimizer::new(
            Arc::clone(&registry),
            Arc::clone(&resolver),
            Arc::clone(&cascade),
            Arc::clone(&events),
        ));
        Self {
            registry,
            resolver,
            cascade,
            refresh,
            active: Mutex::new(None),
        }
    }

    /// The kind registry this coordinator dispatches through.
    pub fn registry(&self) -> &VariableTypeRegistry {
        &self.registry
    }

    /// Initialize a transaction for a scope: supersede any previous session,
    /// seed system variables, then user variables in declaration order.
    pub fn init(
        &self,
        key: &str,
        dashboard: &DashboardContext,
        variables: Vec<Variable>,
    ) -> Arc<DashboardSession> {
        let mut active = self.active.lock();
        if let Some(old) = active.take() {
            if old.status() == TransactionStatus::Fetching && old.key() != key {
                warn!(old = %old.key(), new = %key, "superseding in-flight transaction");
            }
            old.cancel();
        }

        let session = DashboardSession::new(key, dashboard.time_range.clone());
        for system in system_variables(dashboard) {
            session.insert_variable(system);
        }
        for (position, mut variable) in variables.into_iter().enumerate() {
            variable.index = position as i64;
            variable.state = LoadingState::NotStarted;
            session.insert_variable(variable);
        }
        debug!(key = %key, variables = session.with_store(|s| s.len()), "transaction initialized");
        *active = Some(Arc::clone(&session));
        session
    }

    /// Resolve every variable of the scope, honoring dependency order and
    /// URL overrides. Individual failures end up on their variables; the
    /// pass itself always completes.
    pub async fn process_all(
        &self,
        session: &Arc<DashboardSession>,
        overrides: &UrlQueryMap,
    ) -> Result<()> {
        if !session.is_live() {
            return Ok(());
        }
        session.set_status(TransactionStatus::Fetching);

        let variables = session.snapshot();
        let graph = build_graph(&variables, &self.registry);
        let id_by_name: HashMap<&str, &str> = variables
            .iter()
            .map(|v| (v.name.as_str(), v.id.as_str()))
            .collect();

        let passes = variables.iter().map(|variable| {
            let dependency_ids: Vec<String> = graph
                .dependencies_of(&variable.name)
                .into_iter()
                .filter_map(|name| id_by_name.get(name).map(|id| id.to_string()))
                .collect();
            let id = variable.id.clone();
            async move {
                self.resolver
                    .process_variable(session, &id, &dependency_ids, overrides)
                    .await;
            }
        });
        join_all(passes).await;

        if session.is_live() {
            session.set_status(TransactionStatus::Completed);
            debug!(key = %session.key(), "transaction completed");
        }
        Ok(())
    }

    /// Commit a new value for a variable and cascade to its dependents.
    pub async fn set_value(
        &self,
        session: &Arc<DashboardSession>,
        id: &str,
        value: VariableValue,
    ) -> Result<()> {
        self.cascade.set_value(session, id, value).await
    }

    /// Re-run one variable's option fetch (picker open, search filter).
    ///
    /// Unknown ids on a live session are a caller error; stale sessions
    /// no-op as everywhere else.
    pub async fn update_options(
        &self,
        session: &Arc<DashboardSession>,
        id: &str,
        search: Option<&str>,
    ) -> Result<()> {
        if session.is_live() && session.variable(id).is_none() {
            return Err(VariableError::NotFound(id.to_string()));
        }
        self.resolver.update_options(session, id, search).await;
        Ok(())
    }

    /// Apply a time-range change through the refresh-set optimizer.
    pub async fn on_time_range_changed(
        &self,
        session: &Arc<DashboardSession>,
        range: TimeRange,
        mode: RefreshMode,
    ) -> Result<()> {
        self.refresh.on_time_range_changed(session, range, mode).await
    }

    /// Push URL overrides into a live session (browser navigation). Only
    /// variables whose decoded value actually differs are re-applied and
    /// cascaded.
    pub async fn sync_from_url(
        &self,
        session: &Arc<DashboardSession>,
        overrides: &UrlQueryMap,
    ) -> Result<()> {
        let variables = session.snapshot();
        for variable in variables.iter().filter(|v| v.syncs_to_url()) {
            if let Some(raw) = crate::sync::override_for(overrides, &variable.name) {
                self.cascade
                    .set_value_from_url(session, &variable.id, raw)
                    .await?;
            }
        }
        Ok(())
    }

    /// The persisted save model for every user-declared variable.
    pub fn save_model(&self, session: &DashboardSession) -> Result<Vec<serde_json::Value>> {
        session
            .snapshot()
            .iter()
            .filter(|v| v.kind != VariableKind::System)
            .map(|v| self.registry.get(v.kind).save_model(v))
            .collect()
    }

    /// Tear down a scope explicitly. A no-op when the session was already
    /// superseded.
    pub fn clean_up(&self, session: &Arc<DashboardSession>) {
        let mut active = self.active.lock();
        if let Some(current) = active.as_ref() {
            if Arc::ptr_eq(current, session) {
                *active = None;
            }
        }
        session.cancel();
    }
}
