//! Constant, TextBox, and DataSource Kinds
//!
//! The small kinds share a file: constants resolve to their single fixed
//! value, text boxes keep whatever the user last typed (falling back to the
//! definition), and data-source variables ask the provider for the data
//! sources matching their filter.

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{UpdateContext, VariableType};
use crate::variable::{Variable, VariableKind, VariableOption};

/// The `constant` kind: a single fixed value from the definition.
#[derive(Debug)]
pub struct ConstantVariableType;

#[async_trait]
impl VariableType for ConstantVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::Constant
    }

    async fn fetch_options(
        &self,
        variable: &Variable,
        _ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>> {
        Ok(vec![VariableOption::plain(variable.query.trim())])
    }

    fn needs_selection_pass(&self, _variable: &Variable) -> bool {
        true
    }
}

/// The `textbox` kind: the current free-form text is the only option.
#[derive(Debug)]
pub struct TextBoxVariableType;

#[async_trait]
impl VariableType for TextBoxVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::TextBox
    }

    async fn fetch_options(
        &self,
        variable: &Variable,
        _ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>> {
        // Keep the user's text once set; the definition is the default.
        let value = match variable.current.values().first() {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => variable.query.trim().to_string(),
        };
        Ok(vec![VariableOption::plain(value)])
    }

    fn needs_selection_pass(&self, _variable: &Variable) -> bool {
        true
    }
}

/// The `datasource` kind: options are the data sources matching the
/// definition filter, supplied by the provider.
#[derive(Debug)]
pub struct DataSourceVariableType;

#[async_trait]
impl VariableType for DataSourceVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::DataSource
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

    fn needs_selection_pass(&self, _variable: &Variable) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::TimeRange;
    use crate::variable::VariableValue;

    struct NoProvider;

    #[async_trait]
    impl crate::external::OptionProvider for NoProvider {
        async fn fetch_options(
            &self,
            _query: &str,
            _time_range: &TimeRange,
            _search: Option<&str>,
        ) -> Result<Vec<VariableOption>> {
            panic!("static kinds must not hit the provider");
        }
    }

    fn ctx(provider: &dyn crate::external::OptionProvider) -> UpdateContext<'_> {
        UpdateContext {
            provider,
            time_range: TimeRange::default(),
            search: None,
        }
    }

    #[tokio::test]
    async fn constant_resolves_to_its_definition() {
        let provider = NoProvider;
        let v = Variable::constant("cluster", "  main  ");
        let opts = ConstantVariableType.fetch_options(&v, ctx(&provider)).await.unwrap();
        assert_eq!(opts, vec![VariableOption::plain("main")]);
    }

    #[tokio::test]
    async fn textbox_prefers_current_text_over_definition() {
        let provider = NoProvider;
        let mut v = Variable::text_box("filter", "default");
        let opts = TextBoxVariableType.fetch_options(&v, ctx(&provider)).await.unwrap();
        assert_eq!(opts[0].value, "default");

        v.current = VariableValue::Single("typed".into());
        let opts = TextBoxVariableType.fetch_options(&v, ctx(&provider)).await.unwrap();
        assert_eq!(opts[0].value, "typed");
    }
}
