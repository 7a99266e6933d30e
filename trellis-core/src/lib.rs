//! Trellis Core
//!
//! This crate provides the core variable-resolution engine for the Trellis
//! dashboard system. It implements:
//!
//! - The template-variable data model and per-dashboard store
//! - Dependency discovery between variables and cycle-tolerant graph building
//! - Transaction-scoped (cancellable) resolution passes
//! - Cascading recomputation when a variable's value changes
//! - A refresh-set optimizer for time-range changes
//! - Bidirectional URL synchronization of variable values
//!
//! Option fetching, panel rendering, and the picker UI live outside this
//! crate; they plug in through the collaborator traits in [`external`].
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `variable`: the variable record, value/option types, and the store
//! - `registry`: the capability table for the closed set of variable kinds
//! - `kinds`: the built-in kind implementations
//! - `graph`: the cycle-tolerant dependency graph
//! - `engine`: sessions, transactions, resolution, cascade, and refresh
//! - `sync`: URL query-parameter encoding and decoding
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::engine::TransactionCoordinator;
//! use trellis_core::variable::Variable;
//!
//! let coordinator = TransactionCoordinator::new(provider, usage, events);
//! let session = coordinator.init("dash-1", &dashboard, vec![
//!     Variable::query("region", "regions()"),
//!     Variable::query("host", "hosts($region)"),
//! ]);
//! coordinator.process_all(&session, &url_overrides).await?;
//! ```

pub mod engine;
pub mod error;
pub mod external;
pub mod graph;
pub mod kinds;
pub mod registry;
pub mod sync;
pub mod variable;

pub use engine::{DashboardSession, TransactionCoordinator, TransactionStatus};
pub use error::{Result, VariableError};
pub use external::{DashboardContext, EventSink, OptionProvider, PanelUsageIndex, TimeRange};
pub use registry::VariableTypeRegistry;
pub use variable::{
    LoadingState, RefreshPolicy, Variable, VariableKind, VariableOption, VariableValue,
};
