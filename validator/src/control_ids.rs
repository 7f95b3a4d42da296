//! Package-wide ControlId uniqueness.

use std::collections::HashMap;
use std::sync::LazyLock;

use fxpack_core::{Findings, ValidationError};
use regex::Regex;

use crate::heuristics::SourceFile;

static CONTROL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ControlId\s*:\s*"([0-9a-fA-F-]{36})""#).expect("static regex must compile")
});

/// Records an error for every file that repeats an identifier first seen in
/// another file. Comparison is case-insensitive; repeats within one file are
/// ignored.
pub fn check_control_ids(files: &[SourceFile], findings: &mut Findings) {
    let mut first_seen: HashMap<String, &str> = HashMap::new();

    for file in files {
        for caps in CONTROL_ID_RE.captures_iter(&file.content) {
            let id = caps[1].to_ascii_lowercase();
            match first_seen.get(id.as_str()) {
                Some(existing) if *existing != file.relative_path => {
                    findings.error(
                        ValidationError::validation(format!(
                            "Duplicate ControlId '{id}' found in {} and {existing}.",
                            file.relative_path
                        ))
                        .with_file(file.relative_path.clone()),
                    );
                }
                Some(_) => {}
                None => {
                    first_seen.insert(id, &file.relative_path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const ID: &str = "11111111-1111-1111-1111-111111111111";

    fn file(relative_path: &str, content: &str) -> SourceFile {
        SourceFile {
            relative_path: relative_path.to_string(),
            absolute_path: PathBuf::from(relative_path),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_duplicate_across_files_names_both() {
        let files = [
            file("Src/A.fx", &format!("ControlId: \"{ID}\"")),
            file("Src/B.fx", &format!("ControlId : \"{}\"", ID.to_uppercase())),
        ];
        let mut findings = Findings::new();
        check_control_ids(&files, &mut findings);

        assert_eq!(findings.errors.len(), 1);
        assert_eq!(
            findings.errors[0].message,
            format!("Duplicate ControlId '{ID}' found in Src/B.fx and Src/A.fx.")
        );
        assert_eq!(findings.errors[0].file.as_deref(), Some("Src/B.fx"));
    }

    #[test]
    fn test_repeat_within_one_file_is_ignored() {
        let content = format!("ControlId: \"{ID}\"\nControlId: \"{ID}\"");
        let mut findings = Findings::new();
        check_control_ids(&[file("Src/A.fx", &content)], &mut findings);
        assert!(findings.errors.is_empty());
    }
}
