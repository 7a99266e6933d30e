//! System Variables
//!
//! The engine seeds three fixed, hidden, read-only variables at the lowest
//! indices of every scope: `__dashboard`, `__org`, and `__user`. Their
//! values come from the [`crate::external::DashboardContext`] at transaction
//! init and never change afterwards.

use async_trait::async_trait;

use crate::error::Result;
use crate::external::DashboardContext;
use crate::registry::{UpdateContext, VariableType};
use crate::variable::{Variable, VariableKind, VariableOption};

/// Name of the dashboard-title system variable.
pub const DASHBOARD_VARIABLE: &str = "__dashboard";
/// Name of the organization system variable.
pub const ORG_VARIABLE: &str = "__org";
/// Name of the user system variable.
pub const USER_VARIABLE: &str = "__user";

/// Build the three system variables for a scope, at indices -3..-1.
pub fn system_variables(ctx: &DashboardContext) -> Vec<Variable> {
    vec![
        Variable::system(DASHBOARD_VARIABLE, ctx.title.clone(), -3),
        Variable::system(ORG_VARIABLE, ctx.org_id.to_string(), -2),
        Variable::system(USER_VARIABLE, ctx.user.clone(), -1),
    ]
}

/// The `system` kind.
#[derive(Debug)]
pub struct SystemVariableType;

#[async_trait]
impl VariableType for SystemVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::System
    }

    fn depends_on(&self, _variable: &Variable, _other: &Variable) -> bool {
        false
    }

    async fn fetch_options(
        &self,
        variable: &Variable,
        _ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>> {
        // Read-only: the options seeded at init are already final.
        Ok(variable.options.clone())
    }

    fn save_model(&self, _variable: &Variable) -> Result<serde_json::Value> {
        // System variables are engine-owned and never persisted.
        Ok(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::TimeRange;

    fn dashboard_ctx() -> DashboardContext {
        DashboardContext {
            uid: "abc".into(),
            title: "Fleet Overview".into(),
            org_id: 7,
            user: "ops".into(),
            time_range: TimeRange::default(),
        }
    }

    #[test]
    fn system_variables_sit_at_fixed_negative_indices() {
        let vars = system_variables(&dashboard_ctx());
        let indexed: Vec<(&str, i64)> =
            vars.iter().map(|v| (v.name.as_str(), v.index)).collect();
        assert_eq!(
            indexed,
            vec![(DASHBOARD_VARIABLE, -3), (ORG_VARIABLE, -2), (USER_VARIABLE, -1)]
        );
        assert!(vars.iter().all(|v| v.hide && v.skip_url_sync));
    }

    #[test]
    fn system_variables_never_depend_on_anything() {
        let t = SystemVariableType;
        let vars = system_variables(&dashboard_ctx());
        let other = Variable::query("region", "regions()");
        assert!(!t.depends_on(&vars[0], &other));
    }
}
