//! Query Variables
//!
//! Provider-backed: the definition text is evaluated by the
//! [`crate::external::OptionProvider`] against the active time window.
//! These are the variables the refresh policies exist for.

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{UpdateContext, VariableType};
use crate::variable::{RefreshPolicy, Variable, VariableKind, VariableOption};

/// The `query` kind.
#[derive(Debug)]
pub struct QueryVariableType;

#[async_trait]
impl VariableType for QueryVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::Query
    }

    async fn fetch_options(
        &self,
        variable: &Variable,
        ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>> {
        ctx.provider
            .fetch_options(&variable.query, &ctx.time_range, ctx.search)
            .await
    }

    fn save_model(&self, variable: &Variable) -> Result<serde_json::Value> {
        let mut model = serde_json::to_value(variable)?;
        // Refreshing variables re-fetch on load, so persisting their
        // fetched options would only bloat the save model.
        if variable.refresh != RefreshPolicy::Never {
            if let Some(obj) = model.as_object_mut() {
                obj.insert("options".into(), serde_json::Value::Array(Vec::new()));
            }
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::RefreshPolicy;

    #[test]
    fn query_variable_depends_on_referenced_names() {
        let t = QueryVariableType;
        let host = Variable::query("host", "hosts($region)");
        let region = Variable::query("region", "regions()");
        assert!(t.depends_on(&host, &region));
        assert!(!t.depends_on(&region, &host));
    }

    #[test]
    fn refreshing_save_model_drops_options() {
        let t = QueryVariableType;
        let mut v = Variable::query("region", "regions()");
        v.options = vec![VariableOption::plain("us-east")];
        let model = t.save_model(&v).unwrap();
        assert_eq!(model["options"], serde_json::json!([]));

        v.refresh = RefreshPolicy::Never;
        let model = t.save_model(&v).unwrap();
        assert_eq!(model["options"][0]["value"], "us-east");
    }
}
