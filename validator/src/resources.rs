//! Resource manifest reachability.

use std::path::{Component, Path};

use fxpack_core::{ErrorCategory, Findings, ValidationError, ValidationWarning};
use serde_json::Value;

use crate::heuristics::relative_display;
use crate::manifest::read_json_file;

/// Where a resources manifest may live, in priority order.
pub const RESOURCE_MANIFEST_CANDIDATES: &[&str] = &[
    "Resources.json",
    "Resources/Resources.json",
    "References/Resources.json",
];

/// Keys a resource entry may use for its package-relative path.
const PATH_KEYS: &[&str] = &["Path", "path", "FilePath", "filePath"];

/// Every listed resource must exist in the extracted tree.
pub fn check_resources(extracted: &Path, findings: &mut Findings) {
    let Some(manifest_path) = RESOURCE_MANIFEST_CANDIDATES
        .iter()
        .map(|candidate| extracted.join(candidate))
        .find(|path| path.exists())
    else {
        findings.warning(
            ValidationWarning::new(
                "Resources.json not found in package. Media references cannot be validated.",
            )
            .with_category(ErrorCategory::Validation),
        );
        return;
    };

    let label = manifest_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(manifest) = read_json_file(&manifest_path, &label, findings) else {
        return;
    };
    let relative_manifest = relative_display(extracted, &manifest_path);

    for declared in resource_paths(&manifest) {
        let normalized = declared.replace('\\', "/");
        let message = if !is_package_relative(&normalized) {
            format!("Resource entry '{normalized}' points outside the package.")
        } else if !extracted.join(&normalized).is_file() {
            format!("Resource entry '{normalized}' is referenced but not present in the package.")
        } else {
            continue;
        };
        findings.error(ValidationError::validation(message).with_file(relative_manifest.clone()));
    }
}

/// Only plain relative segments; roots, prefixes and `..` escape the package.
fn is_package_relative(declared: &str) -> bool {
    Path::new(declared)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Declared paths from the `Resources` array, or else the `Media` array.
fn resource_paths(manifest: &Value) -> Vec<&str> {
    let entries = manifest
        .get("Resources")
        .and_then(Value::as_array)
        .or_else(|| manifest.get("Media").and_then(Value::as_array));

    entries
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            PATH_KEYS
                .iter()
                .find_map(|key| entry.get(*key).and_then(Value::as_str))
                .filter(|path| !path.is_empty())
        })
        .collect()
}
