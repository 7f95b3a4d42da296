//! Core types for packaging Power Apps formula sources.
//!
//! This crate defines the shared vocabulary of the workspace:
//!
//! - [`ScreenDefinition`], [`ComponentDefinition`], [`ControlDefinition`] -
//!   structured views of `.fx` source files.
//! - [`PropertyMap`] and [`FormulaMap`] - insertion-ordered maps of extracted
//!   values and formulas.
//! - [`ValidationResult`], [`ValidationError`], [`ValidationWarning`] and the
//!   five-way [`ErrorCategory`] taxonomy used by every check.
//! - [`FxError`] - catastrophic failures that prevent a result.
//! - [`RuleTables`] - allow-lists (control types, known functions, required
//!   archive files and manifest keys) as data.
//! - [`ToolConfig`] - YAML tool configuration.
//!
//! # Example
//!
//! ```
//! use fxpack_core::*;
//!
//! let mut findings = Findings::new();
//! findings.error(
//!     ValidationError::validation("Missing required file 'App.json' in package.")
//!         .with_file("app.msapp"),
//! );
//! let result = findings.finish();
//! assert!(!result.is_valid());
//! assert_eq!(result.errors()[0].category, ErrorCategory::Validation);
//! ```

mod config;
mod diagnostics;
mod error;
mod rules;
mod types;

pub use config::{ParserOptions, RuleExtensions, ToolConfig, ValidatorOptions};
pub use diagnostics::{ErrorCategory, Findings, ValidationError, ValidationResult, ValidationWarning};
pub use error::{FxError, Result, SourceKind};
pub use rules::*;
pub use types::*;
