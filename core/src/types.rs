//! Definition types produced by the source parser.
//!
//! Every value here is created fresh for one parse call and owned by the
//! caller afterwards. The types serialize with [`serde`] so downstream
//! builders and the CLI can render them as JSON or YAML.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Insertion-ordered map with overwrite-in-place semantics.
///
/// Re-inserting an existing key replaces its value but keeps the key at its
/// original position, which matches the "last match wins" behavior of the
/// extraction scans while keeping output order stable.
///
/// # Examples
///
/// ```
/// use fxpack_core::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// map.insert("Fill", 1);
/// map.insert("Text", 2);
/// map.insert("Fill", 3);
///
/// assert_eq!(map.get("Fill"), Some(&3));
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Fill", "Text"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A coerced property value.
///
/// Quoted text becomes [`Text`](PropertyValue::Text), `true`/`false` become
/// [`Boolean`](PropertyValue::Boolean), plain decimal digits become
/// [`Number`](PropertyValue::Number). Everything else, including array and
/// record literals, is kept verbatim as an
/// [`Expression`](PropertyValue::Expression); no recursive literal parsing is
/// attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    Expression(String),
}

impl PropertyValue {
    /// Returns the raw text for text and expression values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Expression(s) => Some(s),
            Self::Boolean(_) | Self::Number(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Expression(s) => write!(f, "{s}"),
        }
    }
}

/// Property name → coerced value.
pub type PropertyMap = OrderedMap<PropertyValue>;

/// Property or event name → raw formula source text.
pub type FormulaMap = OrderedMap<String>;

/// One control invocation (e.g. `Button(...)`) found in a source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlDefinition {
    /// Synthesized `{Type}{ordinal}` name. Positional, so not stable across edits.
    pub name: String,
    #[serde(rename = "type")]
    pub control_type: String,
    pub properties: PropertyMap,
    /// Empty unless the parser runs with nested control matching enabled.
    pub children: Vec<ControlDefinition>,
}

/// A `CustomProperty(name, type, default)` declaration in a component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A navigable app page parsed from one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenDefinition {
    /// File stem of the originating file.
    pub name: String,
    pub file: String,
    pub controls: Vec<ControlDefinition>,
    pub properties: PropertyMap,
    pub formulas: FormulaMap,
}

/// A reusable fragment parsed from one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDefinition {
    pub name: String,
    pub file: String,
    /// Always `"Component"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: PropertyMap,
    pub custom_properties: Vec<CustomProperty>,
    pub children: Vec<ControlDefinition>,
}

/// Kind label used by [`ComponentDefinition::kind`].
pub const COMPONENT_KIND: &str = "Component";

/// Output of a directory parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedSources {
    pub screens: Vec<ScreenDefinition>,
    pub components: Vec<ComponentDefinition>,
}

impl ParsedSources {
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty() && self.components.is_empty()
    }

    pub fn find_screen(&self, name: &str) -> Option<&ScreenDefinition> {
        self.screens.iter().find(|s| s.name == name)
    }

    pub fn find_component(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Which external tools were found on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// `true` when nothing is missing and nothing conflicts.
    pub satisfied: bool,
    pub missing: Vec<String>,
    pub conflicts: Vec<String>,
}

impl DependencyReport {
    pub fn from_parts(missing: Vec<String>, conflicts: Vec<String>) -> Self {
        Self {
            satisfied: missing.is_empty() && conflicts.is_empty(),
            missing,
            conflicts,
        }
    }
}
