//! Fixed rule tables consulted by the parser and validators.
//!
//! The allow-lists live here as data so they can be tested, extended from
//! configuration, and passed into components without touching control flow.

use serde::{Deserialize, Serialize};

/// Control types recognized as `Type(...)` invocations.
pub const CONTROL_TYPES: &[&str] = &[
    "Screen",
    "Rectangle",
    "Label",
    "Button",
    "Gallery",
    "Container",
    "TextInput",
    "Dropdown",
    "Checkbox",
    "Toggle",
    "Slider",
    "DatePicker",
    "Image",
    "Icon",
    "Timer",
    "Audio",
    "Video",
    "Camera",
    "Microphone",
    "BarcodeScanner",
    "PDF",
    "PowerBITile",
    "Form",
    "DataCard",
];

/// Function names that never trigger an unknown-function warning.
pub const KNOWN_FUNCTIONS: &[&str] = &[
    "If",
    "Switch",
    "Filter",
    "LookUp",
    "Patch",
    "Collect",
    "Set",
    "Navigate",
    "Notify",
    "Text",
    "Value",
    "DateAdd",
    "DateDiff",
    "Now",
    "Today",
    "CountRows",
    "Sum",
    "Average",
    "Min",
    "Max",
    "Concatenate",
    "Left",
    "Right",
    "Mid",
    "Len",
    "Upper",
    "Lower",
    "Trim",
    "Replace",
    "Substitute",
    "ClearCollect",
    "Clear",
    "Remove",
    "UpdateContext",
    "IsBlank",
    "IsEmpty",
    "CustomProperty",
    "ForAll",
    "Back",
    "Launch",
    "Concat",
    "First",
    "Last",
    "Sort",
    "Search",
    "Round",
    "Not",
    "And",
    "Or",
    "Coalesce",
    "RGBA",
    "GUID",
    "Reset",
    "SubmitForm",
    "ResetForm",
];

/// Calls with side effects that must not appear in `StartScreen`.
pub const BEHAVIOR_FUNCTIONS: &[&str] = &[
    "Collect",
    "ClearCollect",
    "Set",
    "Navigate",
    "Patch",
    "Remove",
    "UpdateContext",
    "Clear",
];

/// Files that must sit at the root of a package archive.
pub const REQUIRED_ARCHIVE_FILES: &[&str] = &["App.json", "Manifest.json", "Properties.json"];

/// Exact-cased keys every package manifest must carry.
pub const REQUIRED_MANIFEST_KEYS: &[&str] = &["AppVersion", "FormatVersion", "Properties", "ScreenOrder"];

/// Manifest format version the validator expects.
pub const EXPECTED_FORMAT_VERSION: &str = "2.0";

/// Extension of formula source files.
pub const SOURCE_EXTENSION: &str = "fx";

/// Directory-name fragments that classify a file as a screen.
pub const SCREEN_FOLDER_HINTS: &[&str] = &["screens", "Screen"];

/// Directory-name fragments that classify a file as a component.
pub const COMPONENT_FOLDER_HINTS: &[&str] = &["components", "Component"];

/// The allow-lists and fixed tokens as owned, extendable data.
///
/// # Examples
///
/// ```
/// use fxpack_core::RuleTables;
///
/// let mut rules = RuleTables::default();
/// assert!(rules.is_control_type("Gallery"));
/// assert!(!rules.is_known_function("MyHelper"));
///
/// rules.known_functions.push("MyHelper".into());
/// assert!(rules.is_known_function("MyHelper"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    pub control_types: Vec<String>,
    pub known_functions: Vec<String>,
    pub behavior_functions: Vec<String>,
    pub required_archive_files: Vec<String>,
    pub required_manifest_keys: Vec<String>,
    pub expected_format_version: String,
    pub source_extension: String,
    pub screen_folder_hints: Vec<String>,
    pub component_folder_hints: Vec<String>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            control_types: owned(CONTROL_TYPES),
            known_functions: owned(KNOWN_FUNCTIONS),
            behavior_functions: owned(BEHAVIOR_FUNCTIONS),
            required_archive_files: owned(REQUIRED_ARCHIVE_FILES),
            required_manifest_keys: owned(REQUIRED_MANIFEST_KEYS),
            expected_format_version: EXPECTED_FORMAT_VERSION.to_string(),
            source_extension: SOURCE_EXTENSION.to_string(),
            screen_folder_hints: owned(SCREEN_FOLDER_HINTS),
            component_folder_hints: owned(COMPONENT_FOLDER_HINTS),
        }
    }
}

impl RuleTables {
    pub fn is_control_type(&self, name: &str) -> bool {
        self.control_types.iter().any(|t| t == name)
    }

    pub fn is_known_function(&self, name: &str) -> bool {
        self.known_functions.iter().any(|f| f == name)
    }

    /// Known functions and control types together form the call allow-list.
    pub fn is_known_call(&self, name: &str) -> bool {
        self.is_known_function(name) || self.is_control_type(name)
    }

    /// Returns `true` if `path` carries the source extension.
    pub fn is_source_file(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.source_extension)
    }

    /// Adds entries not already present, preserving order.
    pub fn extend_control_types(&mut self, extra: &[String]) {
        push_unique(&mut self.control_types, extra);
    }

    pub fn extend_known_functions(&mut self, extra: &[String]) {
        push_unique(&mut self.known_functions, extra);
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn push_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
