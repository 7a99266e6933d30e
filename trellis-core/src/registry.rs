//! Variable Type Registry
//!
//! Behavior for each [`VariableKind`] is looked up at runtime through an
//! explicit capability table. The table is populated once, by
//! [`VariableTypeRegistry::default`] (or a custom builder in tests), never
//! as a side effect of module loading, and queried through a single
//! fail-fast lookup: asking for an unregistered kind is a configuration
//! defect and panics immediately.
//!
//! # Capabilities
//!
//! Each kind answers:
//!
//! - `depends_on`: does `variable` need `other` resolved first?
//! - `fetch_options`: compute the fresh option list (may hit the provider).
//! - `needs_selection_pass`: must an option pass run even when the refresh
//!   policy is `Never` (static kinds that still pick a default)?
//! - `value_for_url` / `set_value_from_url`: the URL-sync contract.
//! - `save_model`: the kind's externally-visible persisted form.
//!
//! Defaults cover the common behavior (textual `$name` reference detection,
//! shared URL encoding, straight serde serialization); kinds override only
//! what differs.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Result, VariableError};
use crate::external::{OptionProvider, TimeRange};
use crate::kinds::{self, contains_variable_reference};
use crate::sync::{self, UrlValue};
use crate::variable::{Variable, VariableKind, VariableOption};

/// Everything an option pass needs besides the variable itself.
pub struct UpdateContext<'a> {
    /// The backend collaborator for provider-backed kinds.
    pub provider: &'a dyn OptionProvider,
    /// The active dashboard time window.
    pub time_range: TimeRange,
    /// Optional picker search filter, passed through to the provider.
    pub search: Option<&'a str>,
}

/// Behavior of one variable kind.
#[async_trait]
pub trait VariableType: Send + Sync + std::fmt::Debug {
    /// The kind this implementation serves.
    fn kind(&self) -> VariableKind;

    /// Whether resolving `variable` requires `other` to be resolved first.
    ///
    /// The default checks `variable.query` for a textual reference to
    /// `other.name` (`$name`, `${name}`, `${name:fmt}`, `[[name]]`).
    fn depends_on(&self, variable: &Variable, other: &Variable) -> bool {
        contains_variable_reference(&variable.query, &other.name)
    }

    /// Compute the fresh option list for `variable`.
    ///
    /// Implementations must not mutate shared state; the resolver commits
    /// the returned options together with the validated selection in one
    /// store write.
    async fn fetch_options(
        &self,
        variable: &Variable,
        ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>>;

    /// Whether an option pass must run during boot even when the variable's
    /// refresh policy is `Never`.
    fn needs_selection_pass(&self, _variable: &Variable) -> bool {
        false
    }

    /// Encode the current value for the URL.
    fn value_for_url(&self, variable: &Variable) -> UrlValue {
        sync::value_for_url(variable)
    }

    /// Apply a raw URL value to the variable (options re-flagged, current
    /// replaced) in a single mutation. Returns whether the value changed.
    fn set_value_from_url(&self, variable: &mut Variable, raw: &UrlValue) -> bool {
        sync::apply_url_value(variable, raw)
    }

    /// The kind's persisted save model.
    fn save_model(&self, variable: &Variable) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(variable)?)
    }
}

/// The capability table: one entry per registered kind.
pub struct VariableTypeRegistry {
    types: HashMap<VariableKind, Box<dyn VariableType>>,
}

impl VariableTypeRegistry {
    /// An empty table. Tests use this to register stub kinds.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register (or replace) the implementation for a kind.
    pub fn register(&mut self, variable_type: Box<dyn VariableType>) {
        self.types.insert(variable_type.kind(), variable_type);
    }

    /// Look up the implementation for a kind.
    ///
    /// # Panics
    ///
    /// Panics when the kind has no registration. A missing entry means the
    /// table was built wrong; there is no sensible recovery at a call site.
    pub fn get(&self, kind: VariableKind) -> &dyn VariableType {
        match self.types.get(&kind) {
            Some(t) => t.as_ref(),
            None => panic!("no variable type registered for kind '{kind}'"),
        }
    }

    /// Fallible lookup for callers that can surface configuration problems.
    pub fn try_get(&self, kind: VariableKind) -> Result<&dyn VariableType> {
        self.types
            .get(&kind)
            .map(|t| t.as_ref())
            .ok_or(VariableError::UnknownKind(kind))
    }

    /// Whether a kind has a registration.
    pub fn contains(&self, kind: VariableKind) -> bool {
        self.types.contains_key(&kind)
    }
}

impl Default for VariableTypeRegistry {
    /// The full built-in table. This is the explicit initialization step:
    /// every kind the engine supports is listed here.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(kinds::SystemVariableType));
        registry.register(Box::new(kinds::QueryVariableType));
        registry.register(Box::new(kinds::CustomVariableType));
        registry.register(Box::new(kinds::ConstantVariableType));
        registry.register(Box::new(kinds::TextBoxVariableType));
        registry.register(Box::new(kinds::IntervalVariableType));
        registry.register(Box::new(kinds::DataSourceVariableType));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_kind() {
        let registry = VariableTypeRegistry::default();
        for kind in [
            VariableKind::System,
            VariableKind::Query,
            VariableKind::Custom,
            VariableKind::Constant,
            VariableKind::TextBox,
            VariableKind::Interval,
            VariableKind::DataSource,
        ] {
            assert!(registry.contains(kind), "missing registration for {kind}");
            assert_eq!(registry.get(kind).kind(), kind);
        }
    }

    #[test]
    #[should_panic(expected = "no variable type registered")]
    fn unregistered_kind_lookup_panics() {
        let registry = VariableTypeRegistry::empty();
        let _ = registry.get(VariableKind::Query);
    }

    #[test]
    fn fallible_lookup_reports_unknown_kind() {
        let registry = VariableTypeRegistry::empty();
        let err = registry.try_get(VariableKind::Custom).unwrap_err();
        assert!(matches!(err, VariableError::UnknownKind(VariableKind::Custom)));
    }
}
