//! Custom Variables
//!
//! Options are parsed from the definition text: a comma-separated list whose
//! entries are either plain values or `label : value` pairs. No provider is
//! involved, but a selection pass still runs at boot so a default gets
//! picked and the definition can be re-parsed after edits.

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{UpdateContext, VariableType};
use crate::variable::{Variable, VariableKind, VariableOption};

/// The `custom` kind.
#[derive(Debug)]
pub struct CustomVariableType;

/// Parse a comma-separated definition into options.
///
/// Each entry is trimmed; ` : ` splits a display label from the value.
pub(crate) fn parse_custom_options(definition: &str) -> Vec<VariableOption> {
    definition
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(" : ") {
            Some((label, value)) => VariableOption::new(label.trim(), value.trim()),
            None => VariableOption::plain(entry),
        })
        .collect()
}

#[async_trait]
impl VariableType for CustomVariableType {
    fn kind(&self) -> VariableKind {
        VariableKind::Custom
    }

    async fn fetch_options(
        &self,
        variable: &Variable,
        _ctx: UpdateContext<'_>,
    ) -> Result<Vec<VariableOption>> {
        Ok(parse_custom_options(&variable.query))
    }

    fn needs_selection_pass(&self, _variable: &Variable) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_values() {
        let opts = parse_custom_options("dev, staging, prod");
        assert_eq!(opts.len(), 3);
        assert_eq!(opts[1].text, "staging");
        assert_eq!(opts[1].value, "staging");
    }

    #[test]
    fn parses_label_value_pairs() {
        let opts = parse_custom_options("Production : prod, Development : dev");
        assert_eq!(opts[0].text, "Production");
        assert_eq!(opts[0].value, "prod");
        assert_eq!(opts[1].text, "Development");
        assert_eq!(opts[1].value, "dev");
    }

    #[test]
    fn skips_empty_entries() {
        let opts = parse_custom_options("a,,b, ,c");
        let values: Vec<&str> = opts.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }
}
