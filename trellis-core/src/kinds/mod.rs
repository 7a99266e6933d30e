//! Built-in Variable Kinds
//!
//! One implementation of [`crate::registry::VariableType`] per kind in the
//! closed set. The registry's `Default` impl registers all of them; nothing
//! here runs at module-load time.
//!
//! Dependency discovery is shared: a variable depends on another when its
//! definition text references the other's name in any of the supported
//! syntaxes (`$name`, `${name}`, `${name:fmt}`, `[[name]]`).

mod custom;
mod interval;
mod query;
mod simple;
mod system;

pub use custom::CustomVariableType;
pub use interval::IntervalVariableType;
pub use query::QueryVariableType;
pub use simple::{ConstantVariableType, DataSourceVariableType, TextBoxVariableType};
pub use system::{
    system_variables, SystemVariableType, DASHBOARD_VARIABLE, ORG_VARIABLE, USER_VARIABLE,
};

use std::sync::OnceLock;

use regex::Regex;

/// Matches every variable-reference syntax in one pass. Capture groups:
/// 1 = `$name`, 2 = `[[name]]`, 3 = `${name}` / `${name:fmt}`.
fn reference_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\$(\w+)|\[\[([\s\S]+?)(?::\w+)?\]\]|\$\{(\w+)(?::[^\}]+)?\}")
            .expect("reference regex is valid")
    })
}

/// Whether `text` contains a reference to the variable called `name`.
pub fn contains_variable_reference(text: &str, name: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    reference_regex().captures_iter(text).any(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .is_some_and(|m| m.as_str() == name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_every_reference_syntax() {
        assert!(contains_variable_reference("hosts($region)", "region"));
        assert!(contains_variable_reference("hosts(${region})", "region"));
        assert!(contains_variable_reference("hosts(${region:csv})", "region"));
        assert!(contains_variable_reference("hosts([[region]])", "region"));
    }

    #[test]
    fn does_not_match_prefixes_or_other_names() {
        // `$regions` references a variable named "regions", not "region".
        assert!(!contains_variable_reference("hosts($regions)", "region"));
        assert!(!contains_variable_reference("hosts($zone)", "region"));
        assert!(!contains_variable_reference("", "region"));
        assert!(!contains_variable_reference("plain text", "region"));
    }
}
