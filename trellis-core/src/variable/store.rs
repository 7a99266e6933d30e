//! Variable Store
//!
//! One [`VariableStore`] exists per dashboard instance. It owns every
//! variable record for that scope, keeps id and name lookups, and hands out
//! declaration-ordered views (system variables at negative indices come
//! first).
//!
//! The store itself is plain data; concurrency control lives in the owning
//! session, which wraps it in a lock and guards every mutation with a
//! scope-liveness check.

use indexmap::IndexMap;

use super::model::{LoadingState, Variable};

/// Per-scope map of variable id to record.
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: IndexMap<String, Variable>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            vars: IndexMap::new(),
        }
    }

    /// Insert a variable, replacing any record with the same id.
    pub fn insert(&mut self, variable: Variable) {
        self.vars.insert(variable.id.clone(), variable);
    }

    /// Look up a variable by id.
    pub fn get(&self, id: &str) -> Option<&Variable> {
        self.vars.get(id)
    }

    /// Look up a variable by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.vars.get_mut(id)
    }

    /// Look up a variable by name (the `$name` reference token).
    pub fn get_by_name(&self, name: &str) -> Option<&Variable> {
        self.vars.values().find(|v| v.name == name)
    }

    /// Resolve a name to its variable id.
    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.get_by_name(name).map(|v| v.id.as_str())
    }

    /// All variables in declaration order (index ascending, so system
    /// variables precede user-declared ones).
    pub fn ordered(&self) -> Vec<&Variable> {
        let mut vars: Vec<&Variable> = self.vars.values().collect();
        vars.sort_by_key(|v| v.index);
        vars
    }

    /// Clones of all variables in declaration order.
    ///
    /// Used to snapshot the store before an await point.
    pub fn ordered_snapshot(&self) -> Vec<Variable> {
        self.ordered().into_iter().cloned().collect()
    }

    /// Move a variable to a new lifecycle state. Returns false when the id
    /// is unknown.
    pub fn set_state(&mut self, id: &str, state: LoadingState) -> bool {
        match self.vars.get_mut(id) {
            Some(v) => {
                v.state = state;
                if state != LoadingState::Error {
                    v.error = None;
                }
                true
            }
            None => false,
        }
    }

    /// Number of variables in the scope.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the scope holds no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Discard every variable. Called on teardown and cancellation.
    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn ordered_puts_system_variables_first() {
        let mut store = VariableStore::new();
        let mut user = Variable::custom("env", "dev,prod");
        user.index = 0;
        store.insert(user);
        store.insert(Variable::system("__dashboard", "Fleet", -3));
        store.insert(Variable::system("__org", "1", -2));

        let names: Vec<&str> = store.ordered().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["__dashboard", "__org", "env"]);
    }

    #[test]
    fn name_lookup_resolves_id() {
        let mut store = VariableStore::new();
        store.insert(Variable::custom("env", "dev,prod"));
        assert_eq!(store.id_of("env"), Some("env"));
        assert!(store.id_of("missing").is_none());
    }

    #[test]
    fn set_state_clears_stale_error() {
        let mut store = VariableStore::new();
        store.insert(Variable::custom("env", "dev,prod"));
        {
            let v = store.get_mut("env").unwrap();
            v.state = LoadingState::Error;
            v.error = Some("boom".into());
        }
        assert!(store.set_state("env", LoadingState::Fetching));
        let v = store.get("env").unwrap();
        assert_eq!(v.state, LoadingState::Fetching);
        assert!(v.error.is_none());
    }

    #[test]
    fn clear_empties_the_scope() {
        let mut store = VariableStore::new();
        store.insert(Variable::custom("env", "dev,prod"));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        assert!(store.get("env").is_none());
    }
}
