//! Property/formula pair scanning and the formula classification heuristic.

use std::sync::LazyLock;

use fxpack_core::FormulaMap;
use regex::{Regex, RegexSet};

/// `Identifier: value` pairs, value running to the next `,`, newline or `}`.
static PROPERTY_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+):\s*([^,\n}]+)").expect("static regex must compile"));

/// Event handler pairs (`OnSelect: ...`, `OnVisible: ...`).
static EVENT_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(On\w+):\s*([^,\n}]+)").expect("static regex must compile"));

/// A value is a formula if any of these match.
static FORMULA_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\b(?:If|Switch|Filter|LookUp|Patch|Collect|Set|Navigate|Notify)\b",
        r"\b(?:Parent\.|ThisItem\.|varTheme\.|col\w+)",
        r"[+\-*/=<>!&|]",
        r"\b(?:Color\.|Font\.|Align\.)",
    ])
    .expect("static regex must compile")
});

/// One `key: value` occurrence in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PropertyPair<'a> {
    pub key: &'a str,
    pub value: &'a str,
    /// Byte offset of the key.
    pub offset: usize,
}

/// Scans every `Identifier: value` pair in `content`, in source order.
pub(crate) fn property_pairs(content: &str) -> Vec<PropertyPair<'_>> {
    scan_pairs(&PROPERTY_PAIR_RE, content)
}

fn scan_pairs<'a>(re: &Regex, content: &'a str) -> Vec<PropertyPair<'a>> {
    re.captures_iter(content)
        .filter_map(|caps| {
            let key = caps.get(1)?;
            let value = caps.get(2)?;
            Some(PropertyPair {
                key: key.as_str(),
                value: trim_value(value.as_str()),
                offset: key.start(),
            })
        })
        .collect()
}

/// Trims whitespace and any trailing `)` that closes a call outside the value.
fn trim_value(raw: &str) -> &str {
    let mut value = raw.trim();
    loop {
        let opens = value.matches('(').count();
        let closes = value.matches(')').count();
        match value.strip_suffix(')') {
            Some(rest) if closes > opens => value = rest.trim_end(),
            _ => return value,
        }
    }
}

/// Returns `true` if `value` looks like a formula rather than a literal.
///
/// # Examples
///
/// ```
/// use fxpack_parser::is_formula;
///
/// assert!(is_formula("If(x, 1, 2)"));
/// assert!(is_formula("Parent.Width - 20"));
/// assert!(is_formula("Color.White"));
/// assert!(!is_formula("\"Hello World\""));
/// assert!(!is_formula("10"));
/// ```
pub fn is_formula(value: &str) -> bool {
    FORMULA_PATTERNS.is_match(value)
}

/// Extracts formulas from `content`.
///
/// Two scans write into one map in sequence: every pair whose value passes
/// [`is_formula`], then every `On...` event pair unconditionally. Later
/// matches for a key overwrite earlier ones.
///
/// # Examples
///
/// ```
/// use fxpack_parser::extract_formulas;
///
/// let formulas = extract_formulas("Fill: Color.White,\nText: \"Hi\",\nOnSelect: Back()\n");
/// assert_eq!(formulas.get("Fill").map(String::as_str), Some("Color.White"));
/// assert_eq!(formulas.get("OnSelect").map(String::as_str), Some("Back()"));
/// assert!(formulas.get("Text").is_none());
/// ```
pub fn extract_formulas(content: &str) -> FormulaMap {
    let mut formulas = FormulaMap::new();

    for pair in property_pairs(content) {
        if is_formula(pair.value) {
            formulas.insert(pair.key, pair.value.to_string());
        }
    }

    for pair in scan_pairs(&EVENT_PAIR_RE, content) {
        formulas.insert(pair.key, pair.value.to_string());
    }

    formulas
}
