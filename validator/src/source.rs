//! Source-tree validation: layout, per-file syntax, assets, naming and the
//! heuristic pass.

use std::path::Path;
use std::sync::LazyLock;

use fxpack_core::{ErrorCategory, Findings, RuleTables, ValidationError, ValidationResult, ValidationWarning};
use fxpack_parser::SourceParser;
use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::heuristics::{SourceFile, analyze_files, relative_display};

/// Folders a tidy source tree is expected to have.
pub const RECOMMENDED_DIRECTORIES: &[&str] = &["screens", "components", "assets"];

const LARGE_SOURCE_BYTES: u64 = 1024 * 1024;
const LARGE_ASSET_BYTES: u64 = 5 * 1024 * 1024;
const MAX_PATH_CHARS: usize = 260;

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpg|jpeg|gif|svg|ico)$").expect("static regex must compile")
});
static INVALID_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"|?*]"#).expect("static regex must compile"));

/// Validates a source directory before it is packaged.
pub fn validate_source_code(dir: &Path, parser: &SourceParser) -> ValidationResult {
    let mut findings = Findings::new();
    let rules = parser.rules();

    if !dir.is_dir() {
        findings.error(
            ValidationError::validation(format!("Source directory not found: {}", dir.display()))
                .with_file(dir.display().to_string()),
        );
        return findings.finish();
    }

    check_layout(dir, rules, &mut findings);
    let sources = check_source_files(dir, parser, &mut findings);
    check_assets(dir, &mut findings);
    check_names(dir, &mut findings);
    check_self_navigation(dir, parser, &mut findings);
    findings.absorb(analyze_files(&sources, rules));

    let result = findings.finish();
    info!(
        dir = %dir.display(),
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "source validation finished"
    );
    result
}

fn check_layout(dir: &Path, rules: &RuleTables, findings: &mut Findings) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            findings.error(ValidationError::validation(format!(
                "Failed to validate directory structure: {err}"
            )));
            return;
        }
    };

    let mut folders = Vec::new();
    let mut root_sources = false;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            folders.push(entry.file_name().to_string_lossy().to_lowercase());
        } else if rules.is_source_file(&path) {
            root_sources = true;
        }
    }

    for expected in RECOMMENDED_DIRECTORIES {
        if !folders.iter().any(|f| f.as_str() == *expected) {
            findings.warning(
                ValidationWarning::new(format!("Recommended directory '{expected}' not found"))
                    .with_category(ErrorCategory::Validation),
            );
        }
    }

    if root_sources {
        findings.warning(
            ValidationWarning::new(
                "Found .fx files in root directory. Consider organizing them in 'screens' or 'components' folders",
            )
            .with_category(ErrorCategory::Validation),
        );
    }
}

/// Syntax-checks every source file and returns the readable ones.
fn check_source_files(dir: &Path, parser: &SourceParser, findings: &mut Findings) -> Vec<SourceFile> {
    let mut sources = Vec::new();
    let mut seen = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name().into_iter().flatten() {
        if !entry.file_type().is_file() || !parser.rules().is_source_file(entry.path()) {
            continue;
        }
        seen += 1;
        let relative = relative_display(dir, entry.path());

        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(err) => {
                findings.error(
                    ValidationError::syntax(format!("Failed to validate file: {err}"))
                        .with_file(&relative),
                );
                continue;
            }
        };

        findings.absorb_result(parser.validate_syntax(&content), Some(relative.as_str()));

        let size = content.len() as u64;
        if size > LARGE_SOURCE_BYTES {
            findings.warning(
                ValidationWarning::new("File is larger than 1MB, which may impact performance")
                    .with_file(&relative),
            );
        }
        if size == 0 {
            findings.warning(ValidationWarning::new("File is empty").with_file(&relative));
        }

        sources.push(SourceFile {
            relative_path: relative,
            absolute_path: entry.into_path(),
            content,
        });
    }

    if seen == 0 {
        findings.error(ValidationError::validation("No .fx files found in source directory"));
    }
    debug!(files = seen, "checked source files");
    sources
}

fn check_assets(dir: &Path, findings: &mut Findings) {
    let Ok(entries) = std::fs::read_dir(dir.join("assets")) else {
        return;
    };

    let mut names: Vec<(String, u64)> = entries
        .flatten()
        .map(|entry| {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (entry.file_name().to_string_lossy().into_owned(), size)
        })
        .collect();
    names.sort();

    if !names.iter().any(|(name, _)| IMAGE_RE.is_match(name)) {
        findings.warning(
            ValidationWarning::new("No image assets found in assets directory")
                .with_category(ErrorCategory::Validation),
        );
    }

    for (name, size) in names {
        if size > LARGE_ASSET_BYTES {
            findings.warning(
                ValidationWarning::new(format!(
                    "Asset file '{name}' is larger than 5MB, which may cause performance issues"
                ))
                .with_file(format!("assets/{name}")),
            );
        }
    }
}

fn check_names(dir: &Path, findings: &mut Findings) {
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name().into_iter().flatten() {
        let relative = relative_display(dir, entry.path());

        if INVALID_NAME_RE.is_match(&relative) {
            findings.error(
                ValidationError::validation(format!(
                    "File name contains invalid characters: {relative}"
                ))
                .with_file(&relative),
            );
        }
        if relative.chars().count() > MAX_PATH_CHARS {
            findings.warning(
                ValidationWarning::new(format!(
                    "File path is longer than 260 characters, which may cause issues on Windows: {relative}"
                ))
                .with_category(ErrorCategory::Validation)
                .with_file(&relative),
            );
        }
    }
}

/// Flags screens whose formulas navigate back to the same screen.
fn check_self_navigation(dir: &Path, parser: &SourceParser, findings: &mut Findings) {
    let parsed = match parser.parse_directory(dir) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "skipping self-navigation check");
            return;
        }
    };

    for screen in &parsed.screens {
        let pattern = format!(r"(?i)Navigate\s*\(\s*{}\s*[,)]", regex::escape(&screen.name));
        let Ok(navigate_self) = Regex::new(&pattern) else {
            continue;
        };
        if screen.formulas.values().any(|formula| navigate_self.is_match(formula)) {
            findings.warning(
                ValidationWarning::new(format!(
                    "Screen '{}' may contain circular navigation reference",
                    screen.name
                ))
                .with_category(ErrorCategory::Validation)
                .with_file(&screen.file),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_missing_directory_is_single_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_source_code(&dir.path().join("nope"), &SourceParser::new());
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message.contains("not found"));
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_empty_directory_has_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_source_code(dir.path(), &SourceParser::new());
        assert!(result.has_error_containing("No .fx files found"));
        assert!(result.has_warning_containing("Recommended directory 'screens' not found"));
        assert!(result.has_warning_containing("Recommended directory 'assets' not found"));
    }

    #[test]
    fn test_invalid_names_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/readme.txt"), "x").unwrap();

        let mut findings = Findings::new();
        check_assets(dir.path(), &mut findings);
        assert_eq!(
            findings.warnings[0].message,
            "No image assets found in assets directory"
        );

        #[cfg(unix)]
        {
            fs::write(dir.path().join("bad?name.fx"), "X: 1").unwrap();
            let mut findings = Findings::new();
            check_names(dir.path(), &mut findings);
            assert_eq!(findings.errors.len(), 1);
            assert_eq!(
                findings.errors[0].message,
                "File name contains invalid characters: bad?name.fx"
            );
        }
    }
}
