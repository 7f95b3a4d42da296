//! Diagnostic vocabulary shared by the parser and the validators.
//!
//! Recoverable problems are recorded as [`ValidationError`]s and
//! [`ValidationWarning`]s in a [`Findings`] accumulator and finished into a
//! [`ValidationResult`]. Only errors affect validity.
//!
//! # Examples
//!
//! ```
//! use fxpack_core::{ErrorCategory, Findings, ValidationError};
//!
//! let mut findings = Findings::new();
//! findings.warn("Package file should have .msapp extension");
//! assert!(findings.clone().finish().is_valid());
//!
//! findings.error(ValidationError::new(ErrorCategory::Validation, "Package file is empty"));
//! let result = findings.finish();
//! assert!(!result.is_valid());
//! assert_eq!(result.errors().len(), 1);
//! assert_eq!(result.warnings().len(), 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Malformed declarative text or malformed JSON.
    Syntax,
    /// Tool or app configuration problems.
    Configuration,
    /// Missing external tools.
    Dependency,
    /// Reserved for package builders.
    Package,
    /// Structural integrity problems.
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "SYNTAX"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Dependency => write!(f, "DEPENDENCY"),
            Self::Package => write!(f, "PACKAGE"),
            Self::Validation => write!(f, "VALIDATION"),
        }
    }
}

/// A recorded error. Any error makes the enclosing result invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    pub category: ErrorCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ValidationError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Syntax, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)?;
        write_location(f, self.file.as_deref(), self.line, self.column)
    }
}

/// A recorded warning. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ValidationWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: None,
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(f, "{category}: {}", self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        write_location(f, self.file.as_deref(), self.line, self.column)
    }
}

fn write_location(
    f: &mut fmt::Formatter<'_>,
    file: Option<&str>,
    line: Option<usize>,
    column: Option<usize>,
) -> fmt::Result {
    let Some(file) = file else {
        return Ok(());
    };
    write!(f, " ({file}")?;
    if let Some(line) = line {
        write!(f, ":{line}")?;
        if let Some(column) = column {
            write!(f, ":{column}")?;
        }
    }
    write!(f, ")")
}

/// Outcome of one parse or validation pass.
///
/// Only constructible from its parts, so `is_valid()` always equals
/// `errors().is_empty()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }
}

impl ValidationResult {
    pub fn from_parts(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Vec<ValidationError>, Vec<ValidationWarning>) {
        (self.errors, self.warnings)
    }

    /// Returns `true` if any error message contains `needle`.
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.message.contains(needle))
    }

    /// Returns `true` if any warning message contains `needle`.
    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.message.contains(needle))
    }
}

/// Accumulator for errors and warnings during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records a plain warning with no category or location.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(ValidationWarning::new(message));
    }

    pub fn warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Appends everything from another pass.
    pub fn absorb(&mut self, other: Findings) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Appends a finished result, tagging entries without a file with `file`.
    pub fn absorb_result(&mut self, result: ValidationResult, file: Option<&str>) {
        let (errors, warnings) = result.into_parts();
        self.errors.extend(errors.into_iter().map(|mut e| {
            if e.file.is_none() {
                e.file = file.map(str::to_string);
            }
            e
        }));
        self.warnings.extend(warnings.into_iter().map(|mut w| {
            if w.file.is_none() {
                w.file = file.map(str::to_string);
            }
            w
        }));
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult::from_parts(self.errors, self.warnings)
    }
}

impl From<ValidationResult> for Findings {
    fn from(result: ValidationResult) -> Self {
        let (errors, warnings) = result.into_parts();
        Self { errors, warnings }
    }
}
