//! Best-effort syntax diagnostics.
//!
//! Four independent checks run over the same text and accumulate into one
//! result; none of them short-circuits the others.

use std::sync::LazyLock;

use fxpack_core::{ErrorCategory, Findings, RuleTables, ValidationError, ValidationResult, ValidationWarning};
use regex::Regex;

use crate::scan::{check_brackets, check_quotes, line_col};

static FUNCTION_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\(").expect("static regex must compile"));

/// `Key:` followed only by blanks up to a comma, line break, closer or EOF.
static EMPTY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+):[ \t]*(?:,|\r?\n|[})]|$)").expect("static regex must compile")
});

/// Runs bracket, quote, function-name and empty-value checks over `content`.
///
/// Unknown function names are warnings; everything else is a SYNTAX error.
///
/// # Examples
///
/// ```
/// use fxpack_core::RuleTables;
/// use fxpack_parser::validate_syntax;
///
/// let rules = RuleTables::default();
/// assert!(validate_syntax("Label(Text: \"Hi\")", &rules).is_valid());
///
/// let result = validate_syntax("Label(Text: \"Hi\"", &rules);
/// assert!(!result.is_valid());
/// assert!(result.has_error_containing("Unclosed brackets"));
/// ```
pub fn validate_syntax(content: &str, rules: &RuleTables) -> ValidationResult {
    let mut findings = Findings::new();

    for error in check_brackets(content) {
        findings.error(error);
    }

    if let Some(error) = check_quotes(content) {
        findings.error(error);
    }

    check_function_calls(content, rules, &mut findings);
    check_empty_values(content, &mut findings);

    findings.finish()
}

fn check_function_calls(content: &str, rules: &RuleTables, findings: &mut Findings) {
    for caps in FUNCTION_CALL_RE.captures_iter(content) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        if rules.is_known_call(name.as_str()) {
            continue;
        }
        let (line, column) = line_col(content, name.start());
        findings.warning(
            ValidationWarning::new(format!("Unknown function: {}", name.as_str()))
                .with_category(ErrorCategory::Validation)
                .at(line, column),
        );
    }
}

fn check_empty_values(content: &str, findings: &mut Findings) {
    for caps in EMPTY_VALUE_RE.captures_iter(content) {
        let Some(key) = caps.get(1) else {
            continue;
        };
        let (line, column) = line_col(content, key.start());
        findings.error(
            ValidationError::syntax(format!("Empty value for property: {}", key.as_str()))
                .at(line, column),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str) -> ValidationResult {
        validate_syntax(content, &RuleTables::default())
    }

    #[test]
    fn test_valid_screen_has_no_errors() {
        let result = check(
            r#"
Screen(
    Fill: Color.White,
    Label(
        Text: "Hello World",
        X: 10, Y: 10
    )
)
"#,
        );
        assert!(result.is_valid(), "{:?}", result.errors());
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_unclosed_quote_is_error() {
        let result = check(
            r#"
Screen(
    Label(
        Text: "Unclosed quote
        X: 10, Y: 10
    )
)
"#,
        );
        assert!(!result.is_valid());
        assert!(result.has_error_containing("Unclosed string literal"));
    }

    #[test]
    fn test_missing_paren_is_error() {
        let result = check(
            r#"
Screen(
    Label(
        Text: "Hello World",
        X: 10, Y: 10
    // Missing closing parenthesis
)
"#,
        );
        assert!(!result.is_valid());
        assert!(result.has_error_containing("Unclosed brackets"));
    }

    #[test]
    fn test_unknown_function_is_warning_only() {
        let result = check("Label(Text: Frobnicate(1))");
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
        let warning = &result.warnings()[0];
        assert_eq!(warning.message, "Unknown function: Frobnicate");
        assert_eq!(warning.category, Some(ErrorCategory::Validation));
        assert_eq!((warning.line, warning.column), (Some(1), Some(13)));
    }

    #[test]
    fn test_empty_property_value_is_error() {
        for content in ["Label(Text: , X: 1)", "Label(Text:\n)", "Text:", "Label(Text: )"] {
            let result = check(content);
            assert!(
                result.has_error_containing("Empty value for property: Text"),
                "{content:?}"
            );
        }
    }

    #[test]
    fn test_checks_do_not_short_circuit() {
        let result = check("Label(Text: , Title: \"open");
        assert!(result.has_error_containing("Unclosed brackets"));
        assert!(result.has_error_containing("Unclosed string literal"));
        assert!(result.has_error_containing("Empty value for property: Text"));
    }
}
