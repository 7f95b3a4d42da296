//! Control, property and custom-property extraction.
//!
//! Extraction is pattern based, not grammar based. Control scanning matches
//! `Type(...)` call shapes for known control types and splits the balanced
//! argument span into top-level `key: value` assignments.

use std::sync::LazyLock;

use fxpack_core::{ControlDefinition, CustomProperty, PropertyMap, RuleTables};
use regex::Regex;

use crate::formula::property_pairs;
use crate::scan::{coerce_value, find_closing_paren, split_top_level_properties};

static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\(").expect("static regex must compile"));

static CUSTOM_PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CustomProperty\s*\(\s*(\w+),\s*(\w+),\s*([^)]+)\)")
        .expect("static regex must compile")
});

/// Extracts every known-control invocation in `text` as a flat list.
///
/// Nested invocations appear as their own entries after their parent, and
/// `children` is always empty. Names are `{Type}{ordinal}` with the 1-based
/// ordinal counted over the whole list.
pub fn extract_controls(text: &str, rules: &RuleTables) -> Vec<ControlDefinition> {
    let mut controls = Vec::new();

    for caps in CALL_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let control_type = name.as_str();
        if !rules.is_control_type(control_type) {
            continue;
        }

        let (args, _) = argument_span(text, whole.end() - 1);
        controls.push(ControlDefinition {
            name: format!("{control_type}{}", controls.len() + 1),
            control_type: control_type.to_string(),
            properties: parse_property_list(args),
            children: Vec::new(),
        });
    }

    controls
}

/// Extracts known-control invocations as a tree.
///
/// Control invocations inside another control's argument span become its
/// `children`. Ordinals are assigned in pre-order over the whole tree.
pub fn extract_control_tree(text: &str, rules: &RuleTables) -> Vec<ControlDefinition> {
    let mut counter = 0;
    collect_tree(text, rules, &mut counter)
}

fn collect_tree(text: &str, rules: &RuleTables, counter: &mut usize) -> Vec<ControlDefinition> {
    let mut controls = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = CALL_RE.captures_at(text, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let control_type = name.as_str();
        if !rules.is_control_type(control_type) {
            cursor = whole.end();
            continue;
        }

        let (args, next) = argument_span(text, whole.end() - 1);
        *counter += 1;
        let ordinal = *counter;
        let children = collect_tree(args, rules, counter);

        controls.push(ControlDefinition {
            name: format!("{control_type}{ordinal}"),
            control_type: control_type.to_string(),
            properties: parse_property_list(args),
            children,
        });
        cursor = next;
    }

    controls
}

/// Returns the text between the `(` at `open` and its partner, plus the
/// offset just past the partner. Unterminated calls run to end of text.
fn argument_span(text: &str, open: usize) -> (&str, usize) {
    match find_closing_paren(text, open) {
        Some(close) => (&text[open + 1..close], close + 1),
        None => (&text[open + 1..], text.len()),
    }
}

/// Parses top-level `key: value` assignments from argument text.
///
/// Segments without an identifier key (for example nested control
/// invocations) are skipped.
pub fn parse_property_list(args: &str) -> PropertyMap {
    let mut properties = PropertyMap::new();

    for segment in split_top_level_properties(args) {
        let Some((key, value)) = segment.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
            continue;
        }
        properties.insert(key, coerce_value(value));
    }

    properties
}

/// Extracts every `Identifier: value` pair in `content`, coerced.
///
/// This runs over the whole text, not per control, so properties of nested
/// controls are included. Later pairs overwrite earlier ones.
pub fn extract_properties(content: &str) -> PropertyMap {
    let mut properties = PropertyMap::new();
    for pair in property_pairs(content) {
        properties.insert(pair.key, coerce_value(pair.value));
    }
    properties
}

/// Extracts `CustomProperty(name, type, default)` declarations.
pub fn extract_custom_properties(content: &str) -> Vec<CustomProperty> {
    CUSTOM_PROPERTY_RE
        .captures_iter(content)
        .map(|caps| CustomProperty {
            name: caps[1].to_string(),
            property_type: caps[2].to_string(),
            default_value: Some(coerce_value(&caps[3])),
            description: None,
        })
        .collect()
}
