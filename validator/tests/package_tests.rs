use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use fxpack_core::{ErrorCategory, ValidationResult, ValidatorOptions};
use fxpack_validator::PackageValidator;
use serde_json::json;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const ID_A: &str = "11111111-1111-1111-1111-111111111111";
const ID_B: &str = "22222222-2222-2222-2222-222222222222";

fn validator() -> PackageValidator {
    PackageValidator::new().with_options(ValidatorOptions {
        run_external_smoke_test: false,
        ..ValidatorOptions::default()
    })
}

fn write_zip(dir: &Path, name: &str, entries: &[(&str, String)]) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default();
    for (entry, content) in entries {
        zip.start_file(*entry, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

fn manifest() -> String {
    json!({
        "AppVersion": "1.0.0",
        "FormatVersion": "2.0",
        "Properties": {"Name": "Inspections"},
        "ScreenOrder": ["Home"]
    })
    .to_string()
}

fn well_formed_entries() -> Vec<(&'static str, String)> {
    vec![
        ("App.json", json!({"Name": "Inspections"}).to_string()),
        ("Manifest.json", manifest()),
        ("Properties.json", json!({"Author": "QA"}).to_string()),
        (
            "Resources/Resources.json",
            json!({"Resources": [{"Path": "Resources\\Assets\\logo.png"}]}).to_string(),
        ),
        ("Resources/Assets/logo.png", "png".to_string()),
        ("Src/App.fx", format!("App(\n    ControlId: \"{ID_A}\"\n)\n")),
        ("Src/Home.fx", format!("Screen(\n    ControlId: \"{ID_B}\"\n)\n")),
    ]
}

fn errors_containing<'a>(result: &'a ValidationResult, needle: &str) -> Vec<&'a str> {
    result
        .errors()
        .iter()
        .map(|e| e.message.as_str())
        .filter(|m| m.contains(needle))
        .collect()
}

#[test]
fn test_well_formed_package_is_valid() {
    let temp = TempDir::new().unwrap();
    let package = write_zip(temp.path(), "Inspections.msapp", &well_formed_entries());

    let result = validator().validate_package(&package).unwrap();

    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors());
    assert!(!result.has_warning_containing("Resources.json not found"));
}

#[test]
fn test_mis_cased_manifest_key_reports_exact_casing() {
    let temp = TempDir::new().unwrap();
    let mut entries = well_formed_entries();
    entries[1].1 = json!({
        "AppVersion": "1.0.0",
        "formatVersion": "2.0",
        "Properties": {},
        "ScreenOrder": ["Home"]
    })
    .to_string();
    let package = write_zip(temp.path(), "App.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();

    assert_eq!(result.errors().len(), 1);
    let error = &result.errors()[0];
    assert!(error.message.contains("Manifest key"));
    assert!(error.message.contains("Use exact casing 'FormatVersion'"));
    assert!(!error.message.ends_with("is required."));
}

#[test]
fn test_nested_archive_aborts_structural_checks() {
    let temp = TempDir::new().unwrap();
    let entries: Vec<(&str, String)> = vec![
        ("App/App.json", "{}".to_string()),
        ("App/Manifest.json", manifest()),
        ("App/Properties.json", "{}".to_string()),
    ];
    let package = write_zip(temp.path(), "Nested.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();

    assert!(!result.is_valid());
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].message.contains("nested under 'App'"));
    assert!(errors_containing(&result, "Manifest").is_empty());
    assert!(!result.has_warning_containing("Resources.json"));
}

#[test]
fn test_duplicate_control_id_names_both_files() {
    let temp = TempDir::new().unwrap();
    let mut entries = well_formed_entries();
    entries[6].1 = format!("Screen(\n    ControlId: \"{ID_A}\"\n)\n");
    let package = write_zip(temp.path(), "Dupes.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();

    let duplicates = errors_containing(&result, "Duplicate ControlId");
    assert_eq!(duplicates.len(), 1);
    assert!(duplicates[0].contains("Src/App.fx"));
    assert!(duplicates[0].contains("Src/Home.fx"));
}

#[test]
fn test_single_control_id_has_no_duplicate_error() {
    let temp = TempDir::new().unwrap();
    let mut entries = well_formed_entries();
    entries.truncate(6);
    let package = write_zip(temp.path(), "Single.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();
    assert!(errors_containing(&result, "Duplicate ControlId").is_empty());
}

#[test]
fn test_missing_required_file_suggests_casing_and_skips_extraction() {
    let temp = TempDir::new().unwrap();
    let entries: Vec<(&str, String)> = vec![
        ("app.json", "{}".to_string()),
        ("Manifest.json", "not json".to_string()),
        ("Properties.json", "{}".to_string()),
    ];
    let package = write_zip(temp.path(), "Casing.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();

    assert_eq!(result.errors().len(), 1);
    assert_eq!(
        result.errors()[0].message,
        "Missing required file 'App.json' in package. Did you mean 'app.json'?"
    );
}

#[test]
fn test_malformed_json_and_missing_resource() {
    let temp = TempDir::new().unwrap();
    let mut entries = well_formed_entries();
    entries[0].1 = "{ broken".to_string();
    entries.remove(4);
    let package = write_zip(temp.path(), "Broken.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();

    let json_error = result
        .errors()
        .iter()
        .find(|e| e.message.starts_with("App.json is not valid JSON"))
        .unwrap();
    assert_eq!(json_error.category, ErrorCategory::Syntax);
    assert_eq!(json_error.file.as_deref(), Some("App.json"));

    let resource = errors_containing(&result, "Resource entry");
    assert_eq!(
        resource,
        vec!["Resource entry 'Resources/Assets/logo.png' is referenced but not present in the package."]
    );
}

#[test]
fn test_resource_paths_must_name_files_inside_the_package() {
    let temp = TempDir::new().unwrap();
    let outside = temp.path().join("outside.png");
    fs::write(&outside, "png").unwrap();

    let mut entries = well_formed_entries();
    entries[3].1 = json!({"Resources": [
        {"Path": outside.to_str().unwrap()},
        {"Path": "../outside.png"},
        {"Path": "Resources"},
        {"Path": "Resources\\Assets\\logo.png"}
    ]})
    .to_string();
    let package = write_zip(temp.path(), "Escape.msapp", &entries);

    let result = validator().validate_package(&package).unwrap();

    let resource = errors_containing(&result, "Resource entry");
    assert_eq!(resource.len(), 3, "{resource:?}");
    assert!(resource[0].ends_with("points outside the package."));
    assert_eq!(
        resource[1],
        "Resource entry '../outside.png' points outside the package."
    );
    assert_eq!(
        resource[2],
        "Resource entry 'Resources' is referenced but not present in the package."
    );
}

#[test]
fn test_missing_package_is_terminal() {
    let temp = TempDir::new().unwrap();
    let result = validator()
        .validate_package(temp.path().join("missing.msapp"))
        .unwrap();

    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].message.starts_with("Package file not found"));
    assert!(result.warnings().is_empty());
}

#[test]
fn test_zero_byte_package_keeps_reporting() {
    let temp = TempDir::new().unwrap();
    let package = temp.path().join("Empty.msapp");
    fs::write(&package, b"").unwrap();

    let result = validator().validate_package(&package).unwrap();

    let messages: Vec<_> = result.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages[0], "Package file is empty");
    assert!(messages[1].starts_with("Failed to read package archive"));
    assert!(result.errors().iter().all(|e| e.category == ErrorCategory::Validation));
}

#[test]
fn test_non_archive_and_wrong_extension() {
    let temp = TempDir::new().unwrap();
    let package = temp.path().join("notes.txt");
    fs::write(&package, "definitely not a zip archive").unwrap();

    let result = validator().validate_package(&package).unwrap();

    assert!(result.has_warning_containing("should have .msapp extension"));
    assert!(result.has_error_containing("Failed to read package archive"));
}

#[test]
fn test_archive_with_only_directories_has_no_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Dirs.msapp");
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.add_directory("Src/", SimpleFileOptions::default()).unwrap();
    zip.finish().unwrap();

    let result = validator().validate_package(&path).unwrap();
    assert!(result.has_error_containing("Package archive does not contain any files"));
}

#[test]
fn test_import_compatibility_flags_spaces() {
    let temp = TempDir::new().unwrap();
    let package = write_zip(temp.path(), "My App.msapp", &well_formed_entries());

    let result = validator().validate_import_compatibility(&package).unwrap();

    assert!(result.is_valid());
    assert!(result.has_warning_containing("file name contains spaces"));
}

#[test]
fn test_missing_external_cli_is_advisory() {
    let temp = TempDir::new().unwrap();
    let package = write_zip(temp.path(), "Smoke.msapp", &well_formed_entries());
    let validator = PackageValidator::new().with_options(ValidatorOptions {
        external_cli: "fxpack-definitely-missing-cli".to_string(),
        ..ValidatorOptions::default()
    });

    let result = validator.validate_package(&package).unwrap();

    assert!(result.is_valid());
    let warning = result
        .warnings()
        .iter()
        .find(|w| w.message.contains("not available. Skipping unpack smoke test."))
        .unwrap();
    assert_eq!(warning.category, Some(ErrorCategory::Dependency));
}
