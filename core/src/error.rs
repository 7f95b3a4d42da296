//! Error type for catastrophic parse and validation failures.
//!
//! Expected problems are recorded as diagnostics instead; see
//! [`Findings`](crate::Findings). An [`FxError`] means a call could not
//! produce a result at all.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ErrorCategory;

/// Which kind of source file a failed parse was reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Screen,
    Component,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screen => write!(f, "screen"),
            Self::Component => write!(f, "component"),
        }
    }
}

/// Errors raised by parser and validator entry points.
#[derive(Debug, Error)]
pub enum FxError {
    /// A source file could not be read.
    #[error("Failed to parse {kind} file: {source}")]
    Read {
        kind: SourceKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory parse abandoned on its first per-file failure.
    #[error("Failed to parse directory: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: Box<FxError>,
    },

    /// The directory tree could not be enumerated.
    #[error("Failed to enumerate source files: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Strict-mode syntax failure.
    #[error("{message}")]
    Syntax {
        message: String,
        file: Option<PathBuf>,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// The package path exists but cannot be inspected.
    #[error("Cannot inspect package: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scratch space for extraction could not be created.
    #[error("Failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    /// Tool configuration could not be loaded.
    #[error("Failed to load configuration: {message}")]
    Config { path: PathBuf, message: String },
}

impl FxError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Read { .. } | Self::Directory { .. } | Self::Walk { .. } | Self::Syntax { .. } => {
                ErrorCategory::Syntax
            }
            Self::Inspect { .. } | Self::Scratch(_) => ErrorCategory::Validation,
            Self::Config { .. } => ErrorCategory::Configuration,
        }
    }

    /// The offending file or directory, when known.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. }
            | Self::Directory { path, .. }
            | Self::Walk { path, .. }
            | Self::Inspect { path, .. }
            | Self::Config { path, .. } => Some(path),
            Self::Syntax { file, .. } => file.as_deref(),
            Self::Scratch(_) => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => *line,
            _ => None,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            Self::Syntax { column, .. } => *column,
            _ => None,
        }
    }

    /// Renders `CATEGORY: message` followed by the location, if any.
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use fxpack_core::FxError;
    ///
    /// let err = FxError::Syntax {
    ///     message: "Unclosed brackets: (".into(),
    ///     file: Some(PathBuf::from("Home.fx")),
    ///     line: Some(3),
    ///     column: None,
    /// };
    /// assert_eq!(err.formatted(), "SYNTAX: Unclosed brackets: (\n  File: Home.fx:3");
    /// ```
    pub fn formatted(&self) -> String {
        let mut out = format!("{}: {self}", self.category());
        if let Some(file) = self.file() {
            out.push_str(&format!("\n  File: {}", file.display()));
            if let Some(line) = self.line() {
                out.push_str(&format!(":{line}"));
                if let Some(column) = self.column() {
                    out.push_str(&format!(":{column}"));
                }
            }
        }
        out
    }
}

/// Convenience alias for results with [`FxError`].
pub type Result<T> = std::result::Result<T, FxError>;
