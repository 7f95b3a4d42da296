//! Tool configuration loaded from YAML.
//!
//! Every field is optional; a missing file section falls back to the
//! defaults, which keep directory parsing and syntax checks lenient.
//!
//! # Example YAML
//!
//! ```yaml
//! parser:
//!   strict_directory: false
//!   strict_syntax: false
//!   nested_controls: false
//!   abandon_on_first_failure: true
//! validator:
//!   run_external_smoke_test: true
//!   external_cli: pac
//!   smoke_test_timeout_secs: 120
//!   max_package_bytes: 52428800
//!   min_package_bytes: 1024
//! rules:
//!   extra_control_types: [HtmlViewer]
//!   extra_functions: [ParseJSON]
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FxError, Result};
use crate::rules::RuleTables;

/// Options controlling the source parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Fail when the source directory does not exist instead of returning
    /// empty results.
    pub strict_directory: bool,
    /// Raise the first syntax error of a file as a parse failure.
    pub strict_syntax: bool,
    /// Place nested control invocations under their parent's `children`.
    pub nested_controls: bool,
    /// Abort a directory parse on the first unreadable file.
    pub abandon_on_first_failure: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strict_directory: false,
            strict_syntax: false,
            nested_controls: false,
            abandon_on_first_failure: true,
        }
    }
}

/// Options controlling the package validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Try an independent unpack with the external platform CLI.
    pub run_external_smoke_test: bool,
    /// Executable name of the external platform CLI.
    pub external_cli: String,
    pub smoke_test_timeout_secs: u64,
    /// Packages above this size get an advisory warning.
    pub max_package_bytes: u64,
    /// Non-empty packages below this size get an advisory warning.
    pub min_package_bytes: u64,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            run_external_smoke_test: true,
            external_cli: "pac".to_string(),
            smoke_test_timeout_secs: 120,
            max_package_bytes: 50 * 1024 * 1024,
            min_package_bytes: 1024,
        }
    }
}

/// Additions to the built-in rule tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleExtensions {
    pub extra_control_types: Vec<String>,
    pub extra_functions: Vec<String>,
}

/// Top-level tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub parser: ParserOptions,
    pub validator: ValidatorOptions,
    pub rules: RuleExtensions,
}

impl ToolConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`FxError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_error = |message: String| FxError::Config {
            path: path.to_path_buf(),
            message,
        };
        let file = std::fs::File::open(path).map_err(|e| config_error(e.to_string()))?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|e| config_error(e.to_string()))
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Built-in rule tables extended with the configured additions.
    pub fn rule_tables(&self) -> RuleTables {
        let mut rules = RuleTables::default();
        rules.extend_control_types(&self.rules.extra_control_types);
        rules.extend_known_functions(&self.rules.extra_functions);
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = ToolConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ToolConfig::default());
        assert!(config.parser.abandon_on_first_failure);
        assert!(!config.parser.strict_directory);
        assert_eq!(config.validator.external_cli, "pac");
    }

    #[test]
    fn test_partial_yaml_overrides_fields() {
        let config = ToolConfig::from_yaml(
            "parser:\n  strict_directory: true\nrules:\n  extra_functions: [ParseJSON]\n",
        )
        .unwrap();
        assert!(config.parser.strict_directory);
        assert!(config.parser.abandon_on_first_failure);
        assert!(config.rule_tables().is_known_function("ParseJSON"));
    }

    #[test]
    fn test_load_reports_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fxpack.yaml");
        std::fs::write(&path, "parser: [not, a, map]").unwrap();

        let err = ToolConfig::load(&path).unwrap_err();
        assert!(matches!(err, FxError::Config { .. }));
        assert_eq!(err.category(), crate::ErrorCategory::Configuration);
    }
}
