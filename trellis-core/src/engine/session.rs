//! Dashboard Sessions
//!
//! A [`DashboardSession`] is the explicit per-scope context object: it owns
//! the variable store, the transaction status, the active time window, and
//! the plumbing for cooperative waiting and cancellation. Every engine
//! operation receives a session instead of reading ambient globals, and
//! every mutation checks the session's live flag first: once a session has
//! been superseded, stale writes silently become no-ops.
//!
//! # Waiting and cancellation
//!
//! Each variable gets a `watch` channel mirroring its lifecycle state.
//! Waiting for a dependency is a single `wait_for` on that channel (the
//! current value is checked first, so there is no missed-notification
//! window), raced against the session-wide cancellation flag. Cancelling a
//! session flips the flag, marks the session dead, and wipes its store;
//! outstanding fetches observe the flag at their next suspension point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::debug;

use crate::external::TimeRange;
use crate::variable::{LoadingState, Variable, VariableStore};

/// Status of the resolution pass owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Created, `process_all` not yet started.
    NotStarted,
    /// A bulk resolution pass is in flight.
    Fetching,
    /// The pass finished; cascades are live from here on.
    Completed,
}

/// Per-dashboard-instance scope: store, transaction state, and signals.
pub struct DashboardSession {
    key: String,
    live: AtomicBool,
    status: Mutex<TransactionStatus>,
    store: RwLock<VariableStore>,
    time_range: RwLock<TimeRange>,
    cancel_tx: watch::Sender<bool>,
    /// Per-variable lifecycle-state signals for dependency waits.
    signals: DashMap<String, watch::Sender<LoadingState>>,
    /// Per-variable in-flight guards: overlapping resolutions of the same
    /// variable are serialized, not interleaved.
    guards: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl DashboardSession {
    /// Create a live, empty session for a scope key.
    pub(crate) fn new(key: impl Into<String>, time_range: TimeRange) -> Arc<Self> {
        let (cancel_tx, _) = watch::channel(false);
        Arc::new(Self {
            key: key.into(),
            live: AtomicBool::new(true),
            status: Mutex::new(TransactionStatus::NotStarted),
            store: RwLock::new(VariableStore::new()),
            time_range: RwLock::new(time_range),
            cancel_tx,
            signals: DashMap::new(),
            guards: DashMap::new(),
        })
    }

    /// The scope key this session serves.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the session is still the live owner of its scope.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Current transaction status.
    pub fn status(&self) -> TransactionStatus {
        *self.status.lock()
    }

    pub(crate) fn set_status(&self, status: TransactionStatus) {
        if self.is_live() {
            *self.status.lock() = status;
        }
    }

    /// The active time window.
    pub fn time_range(&self) -> TimeRange {
        self.time_range.read().clone()
    }

    pub(crate) fn set_time_range(&self, range: TimeRange) {
        if self.is_live() {
            *self.time_range.write() = range;
        }
    }

    /// Read-only access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&VariableStore) -> R) -> R {
        f(&self.store.read())
    }

    /// A clone of one variable's current record.
    pub fn variable(&self, id: &str) -> Option<Variable> {
        self.store.read().get(id).cloned()
    }

    /// Clones of every variable in declaration order.
    pub fn snapshot(&self) -> Vec<Variable> {
        self.store.read().ordered_snapshot()
    }

    /// Insert a variable and wire its state signal and in-flight guard.
    pub(crate) fn insert_variable(&self, variable: Variable) {
        if !self.is_live() {
            return;
        }
        let id = variable.id.clone();
        let (state_tx, _) = watch::channel(variable.state);
        self.signals.insert(id.clone(), state_tx);
        self.guards
            .insert(id, Arc::new(tokio::sync::Mutex::new(())));
        self.store.write().insert(variable);
    }

    /// Mutate one variable and publish its post-mutation state.
    ///
    /// Returns `None` when the session is stale or the id is unknown.
    pub(crate) fn mutate_variable<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Variable) -> R,
    ) -> Option<R> {
        if !self.is_live() {
            return None;
        }
        let (out, state) = {
            let mut store = self.store.write();
            match store.get_mut(id) {
                Some(v) => {
                    let out = f(v);
                    (Some(out), Some(v.state))
                }
                None => (None, None),
            }
        };
        if let Some(state) = state {
            if let Some(signal) = self.signals.get(id) {
                signal.send_replace(state);
            }
        }
        out
    }

    /// Move a variable to a new lifecycle state. Returns false on stale
    /// sessions or unknown ids.
    pub(crate) fn set_state(&self, id: &str, state: LoadingState) -> bool {
        if !self.is_live() {
            return false;
        }
        let ok = self.store.write().set_state(id, state);
        if ok {
            if let Some(signal) = self.signals.get(id) {
                signal.send_replace(state);
            }
        }
        ok
    }

    /// The in-flight guard for a variable.
    pub(crate) fn guard(&self, id: &str) -> Option<Arc<tokio::sync::Mutex<()>>> {
        self.guards.get(id).map(|g| Arc::clone(&g))
    }

    /// Suspend until the variable leaves NotStarted/Fetching, or until the
    /// session is cancelled. Unknown ids return immediately.
    pub(crate) async fn wait_for_terminal(&self, id: &str) {
        let Some(mut rx) = self.signals.get(id).map(|s| s.subscribe()) else {
            return;
        };
        tokio::select! {
            _ = rx.wait_for(|state| state.is_terminal()) => {}
            _ = self.cancelled() => {}
        }
    }

    /// Resolve when the session is cancelled; pends forever otherwise.
    pub(crate) async fn cancelled(&self) {
        let mut rx = self.cancel_tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Tear the session down: mark it dead, signal outstanding fetches, and
    /// wipe the store and side tables so no record of the scope survives.
    pub(crate) fn cancel(&self) {
        if !self.live.swap(false, Ordering::SeqCst) {
            return;
        }
        debug!(key = %self.key, "cancelling dashboard session");
        self.cancel_tx.send_replace(true);
        self.store.write().clear();
        self.signals.clear();
        self.guards.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn stale_sessions_refuse_mutations() {
        let session = DashboardSession::new("dash-1", TimeRange::default());
        session.insert_variable(Variable::custom("env", "a,b"));
        session.cancel();

        assert!(!session.is_live());
        assert!(session.with_store(|s| s.is_empty()));
        assert!(session.signals.is_empty());
        assert!(session.guards.is_empty());
        assert!(!session.set_state("env", LoadingState::Fetching));
        assert!(session
            .mutate_variable("env", |v| v.query.push('x'))
            .is_none());
    }

    #[test]
    fn mutation_publishes_state_on_the_signal() {
        let session = DashboardSession::new("dash-1", TimeRange::default());
        session.insert_variable(Variable::custom("env", "a,b"));

        let mut rx = session.signals.get("env").unwrap().subscribe();
        assert_eq!(*rx.borrow(), LoadingState::NotStarted);

        session.set_state("env", LoadingState::Done);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), LoadingState::Done);
    }

    #[tokio::test]
    async fn wait_for_terminal_returns_for_already_done_variables() {
        let session = DashboardSession::new("dash-1", TimeRange::default());
        session.insert_variable(Variable::custom("env", "a,b"));
        session.set_state("env", LoadingState::Done);
        // Must not hang: the current value is checked before waiting.
        session.wait_for_terminal("env").await;
    }

    #[tokio::test]
    async fn cancellation_releases_waiters() {
        let session = DashboardSession::new("dash-1", TimeRange::default());
        session.insert_variable(Variable::custom("env", "a,b"));

        let waiter = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.wait_for_terminal("env").await })
        };
        session.cancel();
        waiter.await.unwrap();
    }
}
