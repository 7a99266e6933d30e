//! Error Types
//!
//! The engine distinguishes a small taxonomy of failures:
//!
//! - [`VariableError::Provider`]: an option fetch failed. The owning variable
//!   enters the `Error` state and its cascade branch stops there; siblings
//!   keep resolving.
//! - [`VariableError::NotFound`]: an operation referenced a variable id that
//!   does not exist in the current store.
//! - An unregistered variable kind is a configuration defect, not a runtime
//!   error. The registry lookup panics (see [`crate::registry`]).
//! - A stale-scope operation is not an error at all: any mutation whose
//!   session has been superseded silently no-ops. This is expected under
//!   navigation races and deliberately has no variant here.

use thiserror::Error;

use crate::variable::VariableKind;

/// Errors surfaced by the variable engine.
#[derive(Error, Debug)]
pub enum VariableError {
    /// The option provider failed while fetching options for a variable.
    #[error("option provider failed for variable '{variable}': {message}")]
    Provider {
        /// Name of the variable whose fetch failed.
        variable: String,
        /// Provider-supplied failure message.
        message: String,
    },

    /// An operation referenced a variable id that is not in the store.
    #[error("variable '{0}' not found")]
    NotFound(String),

    /// Serialization of a save model failed.
    #[error("save model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A kind value appeared where only registered kinds are valid.
    ///
    /// Only produced by the fallible registry lookup; the common path panics
    /// instead, because a missing registration is a programming defect.
    #[error("no variable type registered for kind '{0}'")]
    UnknownKind(VariableKind),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VariableError>;
