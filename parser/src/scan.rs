//! Low-level text scanning primitives.
//!
//! These helpers know about brackets and the two quote styles and nothing
//! else about the formula language. Everything structural in the parser is
//! built on top of them.

use std::sync::LazyLock;

use fxpack_core::{PropertyValue, ValidationError};
use regex::Regex;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("static regex must compile"));

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}

/// Returns the 1-based `(line, column)` of a byte offset in `text`.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Splits argument text into top-level comma-separated segments.
///
/// Commas nested inside `()`, `{}`, `[]` or either quote style are not split
/// points. Segments are trimmed; empty segments are dropped.
pub fn split_top_level_properties(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth: isize = 0;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if is_quote(ch) => quote = Some(ch),
            None => match ch {
                '(' | '{' | '[' => depth += 1,
                ')' | '}' | ']' => depth -= 1,
                ',' if depth == 0 => {
                    push_segment(&mut segments, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            },
        }
        current.push(ch);
    }
    push_segment(&mut segments, &current);

    segments
}

fn push_segment(segments: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
}

/// Finds the byte index of the `)` matching the `(` at `open_idx`.
///
/// Parentheses inside quoted runs are ignored. Returns `None` when the
/// invocation is never closed.
pub fn find_closing_paren(text: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (idx, ch) in text[open_idx..].char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if is_quote(ch) => quote = Some(ch),
            None if ch == '(' => depth += 1,
            None if ch == ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_idx + idx);
                }
            }
            None => {}
        }
    }
    None
}

/// Stack-based bracket balance check over `()`, `[]` and `{}`.
///
/// A closing bracket with no opener, or with the wrong opener, is reported at
/// its own position. Openers still on the stack at the end are reported in a
/// single trailing error.
pub fn check_brackets(content: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut stack: Vec<char> = Vec::new();

    for (position, (offset, ch)) in content.char_indices().enumerate() {
        match ch {
            '(' | '[' | '{' => stack.push(ch),
            ')' | ']' | '}' => {
                let opener = stack.pop();
                if opener.map(closing_for) != Some(ch) {
                    let (line, column) = line_col(content, offset);
                    errors.push(
                        ValidationError::syntax(format!("Mismatched bracket at position {position}"))
                            .at(line, column),
                    );
                }
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        let open = stack.iter().map(char::to_string).collect::<Vec<_>>().join(", ");
        errors.push(ValidationError::syntax(format!("Unclosed brackets: {open}")));
    }

    errors
}

/// Single-pass quote balance check over `'` and `"` runs.
pub fn check_quotes(content: &str) -> Option<ValidationError> {
    let mut open: Option<(char, usize)> = None;

    for (offset, ch) in content.char_indices() {
        match open {
            Some((q, _)) if ch == q => open = None,
            Some(_) => {}
            None if is_quote(ch) => open = Some((ch, offset)),
            None => {}
        }
    }

    open.map(|(_, offset)| {
        let (line, column) = line_col(content, offset);
        ValidationError::syntax("Unclosed string literal").at(line, column)
    })
}

/// Coerces raw property text into a [`PropertyValue`].
pub fn coerce_value(raw: &str) -> PropertyValue {
    let value = raw.trim();

    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return PropertyValue::Text(value[1..value.len() - 1].to_string());
        }
    }

    match value {
        "true" => return PropertyValue::Boolean(true),
        "false" => return PropertyValue::Boolean(false),
        _ => {}
    }

    if NUMBER_RE.is_match(value) {
        if let Ok(n) = value.parse::<f64>() {
            return PropertyValue::Number(n);
        }
    }

    PropertyValue::Expression(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_nesting_and_quotes() {
        let segments = split_top_level_properties(
            r#"Text: "a, b", Fill: RGBA(0, 0, 0, 1), Items: [1, 2], Rec: {A: 1, B: 2}, X: 10"#,
        );
        assert_eq!(
            segments,
            vec![
                r#"Text: "a, b""#,
                "Fill: RGBA(0, 0, 0, 1)",
                "Items: [1, 2]",
                "Rec: {A: 1, B: 2}",
                "X: 10",
            ]
        );
    }

    #[test]
    fn test_split_single_quoted_comma() {
        let segments = split_top_level_properties("Text: 'x, y', Y: 2");
        assert_eq!(segments, vec!["Text: 'x, y'", "Y: 2"]);
    }

    #[test]
    fn test_find_closing_paren_skips_nested_and_quoted() {
        let text = r#"Label(Text: ")", Fill: RGBA(1, 2, 3, 1)) tail"#;
        let close = find_closing_paren(text, 5).unwrap();
        assert_eq!(&text[close..], ") tail");
    }

    #[test]
    fn test_find_closing_paren_unterminated() {
        assert_eq!(find_closing_paren("Label(Text: 1", 5), None);
    }

    #[test]
    fn test_check_brackets_balanced() {
        assert!(check_brackets(r#"Label(Text: "Hi", Items: [1, {A: 2}])"#).is_empty());
    }

    #[test]
    fn test_check_brackets_unclosed() {
        let errors = check_brackets(r#"Label(Text: "Hi""#);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unclosed brackets: (");
    }

    #[test]
    fn test_check_brackets_mismatched_reports_position() {
        let errors = check_brackets("Label(\n  Items: [1)\n");
        assert_eq!(errors[0].message, "Mismatched bracket at position 18");
        assert_eq!((errors[0].line, errors[0].column), (Some(2), Some(12)));
        // The mismatch consumes `[`; the outer `(` stays open.
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1].message, "Unclosed brackets: (");
    }

    #[test]
    fn test_check_brackets_extra_closer() {
        let errors = check_brackets("Label())");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Mismatched bracket"));
    }

    #[test]
    fn test_check_quotes() {
        assert!(check_quotes(r#"Text: "Hello""#).is_none());
        assert!(check_quotes(r#"Text: "it's""#).is_none());
        let error = check_quotes("X: 1,\nText: \"Hello").unwrap();
        assert_eq!(error.message, "Unclosed string literal");
        assert_eq!((error.line, error.column), (Some(2), Some(7)));
    }

    #[test]
    fn test_coerce_value_literals() {
        assert_eq!(coerce_value(r#""Hi""#), PropertyValue::Text("Hi".into()));
        assert_eq!(coerce_value("'Hi'"), PropertyValue::Text("Hi".into()));
        assert_eq!(coerce_value("true"), PropertyValue::Boolean(true));
        assert_eq!(coerce_value(" false "), PropertyValue::Boolean(false));
        assert_eq!(coerce_value("42"), PropertyValue::Number(42.0));
        assert_eq!(coerce_value("3.5"), PropertyValue::Number(3.5));
        assert_eq!(coerce_value("-3"), PropertyValue::Expression("-3".into()));
        assert_eq!(
            coerce_value("[1, 2]"),
            PropertyValue::Expression("[1, 2]".into())
        );
        assert_eq!(
            coerce_value("Parent.Width"),
            PropertyValue::Expression("Parent.Width".into())
        );
        assert_eq!(coerce_value("\""), PropertyValue::Expression("\"".into()));
    }

    #[test]
    fn test_line_col() {
        let text = "ab\ncd";
        assert_eq!(line_col(text, 0), (1, 1));
        assert_eq!(line_col(text, 4), (2, 2));
    }
}
