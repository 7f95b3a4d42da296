//! The `.msapp` structural validation pipeline.
//!
//! Steps run in a fixed order and only ever append findings. The pipeline
//! stops early only where continuing means nothing: the archive cannot be
//! opened, it has no files, everything is nested under one folder, or a
//! required root file is missing.

use std::path::Path;

use fxpack_core::{
    Findings, FxError, Result, RuleTables, ValidationError, ValidationResult, ValidationWarning,
    ValidatorOptions,
};
use tracing::{debug, info};

use crate::archive::{check_required_files, file_entries, nesting_folder, open_archive};
use crate::control_ids::check_control_ids;
use crate::heuristics::load_source_files;
use crate::manifest::{check_json_files, check_manifest};
use crate::resources::check_resources;
use crate::smoke::run_unpack_smoke_test;

pub const PACKAGE_EXTENSION: &str = "msapp";

/// Validates the archive at `path`.
///
/// # Errors
///
/// [`FxError::Inspect`] if the path exists but cannot be stat'ed, or
/// [`FxError::Scratch`] if no extraction directory can be created. Every
/// other problem is reported in the result.
pub fn validate_package(
    path: &Path,
    rules: &RuleTables,
    options: &ValidatorOptions,
) -> Result<ValidationResult> {
    let mut findings = Findings::new();
    let location = path.display().to_string();

    if !path.exists() {
        findings.error(
            ValidationError::validation(format!("Package file not found: {location}"))
                .with_file(location),
        );
        return Ok(findings.finish());
    }

    if !has_package_extension(path) {
        findings.warning(
            ValidationWarning::new("Package file should have .msapp extension").with_file(&location),
        );
    }

    let size = std::fs::metadata(path)
        .map_err(|source| FxError::Inspect {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    check_size(size, options, &location, &mut findings);

    inspect_structure(path, rules, options, &mut findings)?;

    let result = findings.finish();
    info!(
        package = %location,
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "package validation finished"
    );
    Ok(result)
}

/// Case-insensitive `.msapp` check.
pub fn has_package_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

fn check_size(size: u64, options: &ValidatorOptions, location: &str, findings: &mut Findings) {
    if size == 0 {
        findings.error(ValidationError::validation("Package file is empty").with_file(location));
    } else if size > options.max_package_bytes {
        findings.warning(
            ValidationWarning::new("Package file is larger than 50MB, which may cause import issues")
                .with_file(location),
        );
    } else if size < options.min_package_bytes {
        findings.warning(
            ValidationWarning::new("Package file seems unusually small").with_file(location),
        );
    }
}

fn inspect_structure(
    path: &Path,
    rules: &RuleTables,
    options: &ValidatorOptions,
    findings: &mut Findings,
) -> Result<()> {
    let location = path.display().to_string();

    let Some(mut archive) = open_archive(path, findings) else {
        return Ok(());
    };

    let entries = file_entries(&archive);
    if entries.is_empty() {
        findings.error(
            ValidationError::validation("Package archive does not contain any files")
                .with_file(&location),
        );
        return Ok(());
    }

    if let Some(folder) = nesting_folder(&entries) {
        findings.error(
            ValidationError::validation(format!(
                "Package archive is nested under '{folder}'. Files must be stored at the root of the .msapp archive"
            ))
            .with_file(&location),
        );
        return Ok(());
    }

    check_required_files(&entries, rules, &location, findings);
    if findings.has_errors() {
        return Ok(());
    }

    let scratch = tempfile::Builder::new()
        .prefix("msapp-validate-")
        .tempdir()
        .map_err(FxError::Scratch)?;
    if let Err(err) = archive.extract(scratch.path()) {
        findings.error(
            ValidationError::validation(format!("Failed to extract package archive: {err}"))
                .with_file(&location),
        );
        return Ok(());
    }
    debug!(scratch = %scratch.path().display(), entries = entries.len(), "extracted package");

    check_manifest(scratch.path(), rules, findings);
    check_json_files(scratch.path(), findings);
    check_resources(scratch.path(), findings);

    let sources = load_source_files(scratch.path(), rules);
    check_control_ids(&sources, findings);

    if options.run_external_smoke_test {
        run_unpack_smoke_test(path, options, findings);
    }

    Ok(())
}
