//! Manifest schema and JSON validity checks over an extracted package.

use std::path::Path;

use fxpack_core::{ErrorCategory, Findings, RuleTables, ValidationError, ValidationWarning};
use serde_json::{Map, Value};

pub const MANIFEST_FILE: &str = "Manifest.json";

/// Reads and parses a JSON file, recording why it could not be used.
///
/// A missing file is a VALIDATION error; malformed JSON is a SYNTAX error.
/// Both are tagged with `label`.
pub fn read_json_file(path: &Path, label: &str, findings: &mut Findings) -> Option<Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            findings.error(
                ValidationError::validation(format!("{label} is missing from the package."))
                    .with_file(label),
            );
            return None;
        }
        Err(err) => {
            findings.error(
                ValidationError::validation(format!("{label} could not be read: {err}"))
                    .with_file(label),
            );
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            findings.error(
                ValidationError::new(
                    ErrorCategory::Syntax,
                    format!("{label} is not valid JSON: {err}"),
                )
                .with_file(label),
            );
            None
        }
    }
}

/// Validates `Manifest.json` in the extracted tree.
pub fn check_manifest(extracted: &Path, rules: &RuleTables, findings: &mut Findings) {
    let Some(manifest) = read_json_file(&extracted.join(MANIFEST_FILE), MANIFEST_FILE, findings)
    else {
        return;
    };
    match manifest.as_object() {
        Some(object) => check_manifest_object(object, rules, findings),
        None => findings.error(manifest_error("Manifest.json must contain a JSON object.")),
    }
}

/// Schema rules for an already-parsed manifest object.
pub fn check_manifest_object(manifest: &Map<String, Value>, rules: &RuleTables, findings: &mut Findings) {
    for key in &rules.required_manifest_keys {
        if manifest.contains_key(key) {
            continue;
        }
        let mis_cased = manifest.keys().any(|k| k.eq_ignore_ascii_case(key));
        let message = if mis_cased {
            format!("Manifest key '{key}' is missing or mis-cased. Use exact casing '{key}'.")
        } else {
            format!("Manifest key '{key}' is required.")
        };
        findings.error(manifest_error(message));
    }

    if let Some(version) = manifest.get("FormatVersion") {
        if version.as_str() != Some(rules.expected_format_version.as_str()) {
            let shown = version
                .as_str()
                .map_or_else(|| version.to_string(), str::to_string);
            findings.warning(
                ValidationWarning::new(format!(
                    "Unexpected manifest FormatVersion '{shown}'. Expected '{}'.",
                    rules.expected_format_version
                ))
                .with_category(ErrorCategory::Validation)
                .with_file(MANIFEST_FILE),
            );
        }
    }

    match manifest.get("ScreenOrder") {
        Some(Value::Array(order)) if order.is_empty() => findings.warning(
            ValidationWarning::new(
                "Manifest ScreenOrder is empty. App may not have a deterministically ordered start screen.",
            )
            .with_category(ErrorCategory::Validation)
            .with_file(MANIFEST_FILE),
        ),
        Some(Value::Array(_)) | None => {}
        Some(_) => findings.error(manifest_error(
            "Manifest ScreenOrder must be an array of screen identifiers.",
        )),
    }

    if manifest.get("Properties").is_some_and(|v| !v.is_object()) {
        findings.error(manifest_error("Manifest Properties section must be an object."));
    }
}

/// `App.json` and `Properties.json` must both parse.
pub fn check_json_files(extracted: &Path, findings: &mut Findings) {
    for label in ["App.json", "Properties.json"] {
        let _ = read_json_file(&extracted.join(label), label, findings);
    }
}

fn manifest_error(message: impl Into<String>) -> ValidationError {
    ValidationError::validation(message).with_file(MANIFEST_FILE)
}
