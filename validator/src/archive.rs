//! Archive-level structure checks: readability, entry layout and required
//! root files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use fxpack_core::{Findings, RuleTables, ValidationError};
use tracing::debug;
use zip::ZipArchive;

pub type PackageArchive = ZipArchive<BufReader<File>>;

/// Opens `path` as a zip container, recording a VALIDATION error on failure.
pub fn open_archive(path: &Path, findings: &mut Findings) -> Option<PackageArchive> {
    let opened = File::open(path)
        .map_err(zip::result::ZipError::Io)
        .and_then(|file| ZipArchive::new(BufReader::new(file)));

    match opened {
        Ok(archive) => Some(archive),
        Err(err) => {
            findings.error(
                ValidationError::validation(format!("Failed to read package archive: {err}"))
                    .with_file(path.display().to_string()),
            );
            None
        }
    }
}

/// Non-directory entry names, sorted.
pub fn file_entries(archive: &PackageArchive) -> Vec<String> {
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    entries.sort();
    debug!(entries = entries.len(), "enumerated archive entries");
    entries
}

/// Returns the folder every entry is nested under, if the archive has no
/// root-level entries and exactly one distinct first segment.
///
/// ```
/// use fxpack_validator::archive::nesting_folder;
///
/// let nested = vec!["App/App.json".to_string(), "App/Manifest.json".to_string()];
/// assert_eq!(nesting_folder(&nested), Some("App"));
///
/// let mixed = vec!["App.json".to_string(), "Src/Home.fx".to_string()];
/// assert_eq!(nesting_folder(&mixed), None);
/// ```
pub fn nesting_folder(entries: &[String]) -> Option<&str> {
    if entries.iter().any(|name| !name.contains('/')) {
        return None;
    }
    let mut segments = entries.iter().filter_map(|name| name.split('/').next());
    let first = segments.next()?;
    segments.all(|segment| segment == first).then_some(first)
}

/// Checks the required root files, suggesting the actual casing when an
/// entry matches case-insensitively.
pub fn check_required_files(
    entries: &[String],
    rules: &RuleTables,
    package: &str,
    findings: &mut Findings,
) {
    for required in &rules.required_archive_files {
        if entries.iter().any(|name| name == required) {
            continue;
        }
        let suggestion = entries
            .iter()
            .find(|name| name.eq_ignore_ascii_case(required))
            .map(|actual| format!(" Did you mean '{actual}'?"))
            .unwrap_or_default();
        findings.error(
            ValidationError::validation(format!(
                "Missing required file '{required}' in package.{suggestion}"
            ))
            .with_file(package),
        );
    }
}
