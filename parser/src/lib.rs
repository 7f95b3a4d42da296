//! Best-effort parser for Power Apps `.fx` formula sources.
//!
//! Extraction is pattern based. It recovers screens, components, control
//! invocations, property assignments and formulas from source text without
//! a grammar, and reports syntax problems as diagnostics rather than
//! failing.
//!
//! # Main entry points
//!
//! - [`SourceParser::parse_screen_file`] and
//!   [`SourceParser::parse_component_file`] read one file.
//! - [`SourceParser::parse_directory`] walks a source tree and classifies
//!   every `.fx` file as a screen or a component.
//! - [`validate_syntax`] and [`extract_formulas`] work on text directly.
//!
//! # Example
//!
//! ```
//! use fxpack_parser::SourceParser;
//!
//! let parser = SourceParser::new();
//! let controls = parser.extract_controls("Screen(Fill: Color.White, Label(Text: \"Hi\"))");
//! assert_eq!(controls[0].name, "Screen1");
//! assert_eq!(controls[1].name, "Label2");
//!
//! let result = parser.validate_syntax("Label(Text: \"Hi\")");
//! assert!(result.is_valid());
//! ```

pub mod directory;
pub mod extract;
pub mod formula;
pub mod scan;
pub mod syntax;

use std::path::Path;

use fxpack_core::{
    COMPONENT_KIND, ComponentDefinition, ControlDefinition, FormulaMap, FxError, ParsedSources,
    ParserOptions, Result, RuleTables, ScreenDefinition, SourceKind, ValidationResult,
};
use tracing::{debug, warn};

use crate::directory::{SourceClass, classify, source_files};

pub use crate::extract::{extract_custom_properties, extract_properties};
pub use crate::formula::{extract_formulas, is_formula};
pub use crate::syntax::validate_syntax;

/// Turns `.fx` source text into screen and component definitions.
#[derive(Debug, Clone, Default)]
pub struct SourceParser {
    rules: RuleTables,
    options: ParserOptions,
}

impl SourceParser {
    /// Creates a parser with the built-in rule tables and lenient options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: RuleTables) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses one screen file.
    ///
    /// The name is the file stem. Controls, properties and formulas are all
    /// extracted over the whole file text.
    ///
    /// # Errors
    ///
    /// [`FxError::Read`] if the file cannot be read, or [`FxError::Syntax`]
    /// in strict-syntax mode.
    pub fn parse_screen_file(&self, path: impl AsRef<Path>) -> Result<ScreenDefinition> {
        let path = path.as_ref();
        let content = self.read_source(path, SourceKind::Screen)?;

        Ok(ScreenDefinition {
            name: file_stem(path),
            file: path.display().to_string(),
            controls: self.extract_controls(&content),
            properties: extract_properties(&content),
            formulas: extract_formulas(&content),
        })
    }

    /// Parses one component file.
    ///
    /// Same pipeline as screens, plus `CustomProperty(...)` declarations.
    /// Controls land in `children`.
    ///
    /// # Errors
    ///
    /// [`FxError::Read`] if the file cannot be read, or [`FxError::Syntax`]
    /// in strict-syntax mode.
    pub fn parse_component_file(&self, path: impl AsRef<Path>) -> Result<ComponentDefinition> {
        let path = path.as_ref();
        let content = self.read_source(path, SourceKind::Component)?;

        Ok(ComponentDefinition {
            name: file_stem(path),
            file: path.display().to_string(),
            kind: COMPONENT_KIND.to_string(),
            properties: extract_properties(&content),
            custom_properties: extract_custom_properties(&content),
            children: self.extract_controls(&content),
        })
    }

    /// See [`extract_formulas`].
    pub fn extract_formulas(&self, content: &str) -> FormulaMap {
        extract_formulas(content)
    }

    /// Runs [`validate_syntax`] with this parser's rule tables.
    pub fn validate_syntax(&self, content: &str) -> ValidationResult {
        validate_syntax(content, &self.rules)
    }

    /// Extracts control invocations, flat or nested per the options.
    pub fn extract_controls(&self, content: &str) -> Vec<ControlDefinition> {
        if self.options.nested_controls {
            extract::extract_control_tree(content, &self.rules)
        } else {
            extract::extract_controls(content, &self.rules)
        }
    }

    /// Parses every `.fx` file under `dir`.
    ///
    /// Files are visited in path order. A missing directory yields empty
    /// results unless `strict_directory` is set.
    ///
    /// # Errors
    ///
    /// The first per-file failure is returned wrapped in
    /// [`FxError::Directory`] and the remaining files are not parsed. With
    /// `abandon_on_first_failure` off, failing files are logged and skipped.
    pub fn parse_directory(&self, dir: impl AsRef<Path>) -> Result<ParsedSources> {
        let dir = dir.as_ref();
        let wrap = |source: FxError| FxError::Directory {
            path: dir.to_path_buf(),
            source: Box::new(source),
        };

        let Some(files) = source_files(dir, &self.rules).map_err(wrap)? else {
            if self.options.strict_directory {
                return Err(wrap(FxError::Walk {
                    path: dir.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("Source directory not found: {}", dir.display()),
                    ),
                }));
            }
            debug!(dir = %dir.display(), "source directory does not exist");
            return Ok(ParsedSources::default());
        };

        let mut parsed = ParsedSources::default();
        for file in files {
            let class = classify(dir, &file, &self.rules, || std::fs::read_to_string(&file).ok());
            debug!(file = %file.display(), ?class, "classified source file");

            let outcome = match class {
                SourceClass::Screen => self.parse_screen_file(&file).map(|s| parsed.screens.push(s)),
                SourceClass::Component => self
                    .parse_component_file(&file)
                    .map(|c| parsed.components.push(c)),
            };

            if let Err(err) = outcome {
                if self.options.abandon_on_first_failure {
                    return Err(wrap(err));
                }
                warn!(file = %file.display(), error = %err, "skipping unparseable source file");
            }
        }

        debug!(
            dir = %dir.display(),
            screens = parsed.screens.len(),
            components = parsed.components.len(),
            "parsed source directory"
        );
        Ok(parsed)
    }

    fn read_source(&self, path: &Path, kind: SourceKind) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|source| FxError::Read {
            kind,
            path: path.to_path_buf(),
            source,
        })?;

        if self.options.strict_syntax {
            let result = self.validate_syntax(&content);
            if let Some(first) = result.errors().first() {
                return Err(FxError::Syntax {
                    message: first.message.clone(),
                    file: Some(path.to_path_buf()),
                    line: first.line,
                    column: first.column,
                });
            }
        }

        Ok(content)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_option_switches_control_shape() {
        let text = "Screen(Label(Text: 1), Button(Text: 2))";
        let flat = SourceParser::new().extract_controls(text);
        assert_eq!(flat.len(), 3);

        let nested = SourceParser::new()
            .with_options(ParserOptions {
                nested_controls: true,
                ..ParserOptions::default()
            })
            .extract_controls(text);
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].children.len(), 2);
    }

    #[test]
    fn test_extra_control_types_are_recognized() {
        let mut rules = RuleTables::default();
        rules.extend_control_types(&["HtmlViewer".to_string()]);
        let parser = SourceParser::new().with_rules(rules);

        let controls = parser.extract_controls("HtmlViewer(HtmlText: \"<b>x</b>\")");
        assert_eq!(controls[0].name, "HtmlViewer1");
        assert!(parser.validate_syntax("HtmlViewer(X: 1)").warnings().is_empty());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("src/screens/Home.fx")), "Home");
        assert_eq!(file_stem(Path::new("App.OnStart.fx")), "App.OnStart");
    }
}
