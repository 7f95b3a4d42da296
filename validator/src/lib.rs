//! Structural validation for `.msapp` packages and their source trees.
//!
//! [`PackageValidator`] checks a built archive independent of how it was
//! produced: container readability, root layout, required files, manifest
//! schema, JSON validity, resource reachability and ControlId uniqueness.
//! It can also check a source directory before packaging, including the
//! pattern-based guardrails in [`heuristics`].
//!
//! Every check records into a [`ValidationResult`]; only catastrophic
//! conditions return an [`FxError`](fxpack_core::FxError).
//!
//! # Example
//!
//! ```
//! use fxpack_validator::PackageValidator;
//!
//! let validator = PackageValidator::new();
//! let result = validator.validate_package("does/not/exist.msapp").unwrap();
//! assert!(!result.is_valid());
//! assert!(result.errors()[0].message.starts_with("Package file not found"));
//! ```

pub mod archive;
pub mod control_ids;
pub mod deps;
pub mod heuristics;
pub mod manifest;
pub mod package;
pub mod resources;
pub mod smoke;
pub mod source;

use std::path::Path;

use fxpack_core::{
    DependencyReport, ErrorCategory, Findings, Result, RuleTables, ToolConfig, ValidationError,
    ValidationResult, ValidationWarning, ValidatorOptions,
};
use fxpack_parser::SourceParser;
use tracing::info;

/// Validates packages and source trees against a set of rule tables.
#[derive(Debug, Clone, Default)]
pub struct PackageValidator {
    rules: RuleTables,
    options: ValidatorOptions,
    parser: SourceParser,
}

impl PackageValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a validator from tool configuration.
    pub fn from_config(config: &ToolConfig) -> Self {
        let rules = config.rule_tables();
        Self {
            parser: SourceParser::new()
                .with_rules(rules.clone())
                .with_options(config.parser.clone()),
            rules,
            options: config.validator.clone(),
        }
    }

    pub fn with_rules(mut self, rules: RuleTables) -> Self {
        self.parser = self.parser.with_rules(rules.clone());
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn parser(&self) -> &SourceParser {
        &self.parser
    }

    /// Runs the structural pipeline over a built archive.
    ///
    /// # Errors
    ///
    /// Only when the package cannot be stat'ed or scratch space cannot be
    /// created; see [`package::validate_package`].
    pub fn validate_package(&self, path: impl AsRef<Path>) -> Result<ValidationResult> {
        package::validate_package(path.as_ref(), &self.rules, &self.options)
    }

    /// Checks a source directory: layout, per-file syntax, assets, names,
    /// self-navigation and the heuristic guardrails.
    pub fn validate_source_code(&self, dir: impl AsRef<Path>) -> ValidationResult {
        source::validate_source_code(dir.as_ref(), &self.parser)
    }

    /// [`validate_package`](Self::validate_package) plus file-name
    /// advisories for import tooling.
    pub fn validate_import_compatibility(&self, path: impl AsRef<Path>) -> Result<ValidationResult> {
        let path = path.as_ref();
        let mut findings = Findings::from(self.validate_package(path)?);
        let location = path.display().to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if file_name.contains(' ') {
            findings.warning(
                ValidationWarning::new(
                    "Package file name contains spaces, which may cause import issues in some environments",
                )
                .with_file(&location),
            );
        }
        if file_name.chars().count() > 100 {
            findings.warning(
                ValidationWarning::new(
                    "Package file name is longer than 100 characters, which may cause import issues",
                )
                .with_file(&location),
            );
        }

        Ok(findings.finish())
    }

    /// Looks up the external tools on `PATH`.
    pub fn check_dependencies(&self) -> DependencyReport {
        deps::check_dependencies(&self.options)
    }

    /// Source validation, dependency lookup and a trial directory parse.
    ///
    /// Missing tools become DEPENDENCY errors here, unlike the package
    /// smoke test where they are advisory.
    pub fn dry_run_validation(&self, dir: impl AsRef<Path>) -> ValidationResult {
        let dir = dir.as_ref();
        let mut findings = Findings::from(self.validate_source_code(dir));

        let report = self.check_dependencies();
        for missing in &report.missing {
            findings.error(ValidationError::new(
                ErrorCategory::Dependency,
                format!("Missing dependency: {missing}"),
            ));
        }
        for conflict in &report.conflicts {
            findings.error(ValidationError::new(
                ErrorCategory::Dependency,
                format!("Dependency conflict: {conflict}"),
            ));
        }

        match self.parser.parse_directory(dir) {
            Ok(parsed) => {
                if parsed.screens.is_empty() {
                    findings.warning(
                        ValidationWarning::new("No screens found in source directory")
                            .with_category(ErrorCategory::Validation),
                    );
                }
                info!(
                    screens = parsed.screens.len(),
                    components = parsed.components.len(),
                    "dry run parsed sources"
                );
            }
            Err(err) => findings.error(ValidationError::syntax(format!(
                "Failed to parse source files: {err}"
            ))),
        }

        let result = findings.finish();
        info!(
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "dry run finished"
        );
        result
    }
}
