//! Interval Variables
//!
//! Options are a comma-separated list of duration expressions ("1m,10m,1h").
//! The engine does not interpret the durations; consumers substitute them
//! into queries as-is.

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{UpdateContext, VariableType};
use crate::variable::{Variable, VariableKind, VariableOption};

/// The `interval` kind.
#[derive(Debug)]
pub struct IntervalVariableType;

#[async_trait]
impl VariableType for IntervalVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::Interval
    }

    fn depends_on(&self, _variable: &Variable, _other: &Variable) -> bool {
        // Duration lists cannot reference other variables.
        false
    }

    async fn fetch_options(
        &self,
        variable: &Variable,
        _ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>> {
        Ok(variable
            .query
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(VariableOption::plain)
            .collect())
    }

    fn needs_selection_pass(&self, _variable: &Variable) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_never_depends_on_anything() {
        let t = IntervalVariableType;
        let interval = Variable::interval("step", "$region,1m");
        let region = Variable::query("region", "regions()");
        assert!(!t.depends_on(&interval, &region));
    }
}
