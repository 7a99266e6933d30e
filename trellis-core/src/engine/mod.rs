//! Resolution Engine
//!
//! The moving parts of variable resolution:
//!
//! - [`DashboardSession`]: one scope's store, status, and signals.
//! - [`TransactionCoordinator`]: owns the init → fetch → complete/cancel
//!   lifecycle, one transaction per scope key at a time.
//! - [`OptionResolver`]: drives one variable's state transitions.
//! - [`CascadeScheduler`]: re-resolves dependents after a value change.
//! - [`RefreshSetOptimizer`]: picks the minimal set to refresh directly when
//!   the time window moves.
//!
//! # Concurrency model
//!
//! One logical scheduler: every operation is an `async fn` suspended
//! cooperatively, never a thread. Independent variables may have fetches
//! outstanding simultaneously; dependent variables are ordered by waiting on
//! per-variable state signals. Cancellation is scope-keyed: superseding a
//! session aborts its outstanding fetches best-effort and turns its stale
//! writes into no-ops. There is no internal timeout: a hung provider leaves
//! its variable Fetching until the scope is cancelled.

mod cascade;
mod refresh;
mod resolver;
mod session;
mod transaction;

pub use cascade::CascadeScheduler;
pub use refresh::{refresh_set, RefreshMode, RefreshSetOptimizer};
pub use resolver::{OptionResolver, UpdateOutcome};
pub use session::{DashboardSession, TransactionStatus};
pub use transaction::TransactionCoordinator;
