//! Variable Data Model
//!
//! This module defines the template-variable record and its building blocks:
//!
//! - [`VariableValue`] and [`VariableOption`]: the selected value(s) and the
//!   selectable options, with the `$__all` sentinel for "match all".
//! - [`Variable`]: the per-variable record (kind, definition, lifecycle
//!   state, refresh policy, URL-sync flags, declaration index).
//! - [`VariableStore`]: the per-dashboard-instance map of variables.
//!
//! Values are deliberately loose (a scalar or an ordered collection of
//! strings) because the option provider decides what a value means. The one
//! invariant the engine enforces is normalized equality: a one-element
//! collection compares equal to its scalar equivalent, which keeps URL
//! round-trips from triggering spurious refreshes.

mod model;
mod store;
mod value;

pub use model::{LoadingState, RefreshPolicy, Variable, VariableKind};
pub use store::VariableStore;
pub use value::{VariableOption, VariableValue, ALL_VALUE, ALL_VARIABLE_TEXT};
