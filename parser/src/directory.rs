//! Source tree enumeration and screen/component classification.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use fxpack_core::{FxError, Result, RuleTables};
use regex::Regex;
use walkdir::WalkDir;

static LEADING_SCREEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Screen\s*\(").expect("static regex must compile"));

const ACTIVE_SCREEN_TOKEN: &str = "App.ActiveScreen";

/// How a source file will be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceClass {
    Screen,
    Component,
}

/// Lists every source file under `root`, sorted by path.
///
/// Returns `Ok(None)` when `root` does not exist.
pub fn source_files(root: &Path, rules: &RuleTables) -> Result<Option<Vec<PathBuf>>> {
    if !root.exists() {
        return Ok(None);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| FxError::Walk {
            path: root.to_path_buf(),
            source: std::io::Error::from(err),
        })?;
        // Links are listed, not followed; reading them reports any breakage.
        if !entry.file_type().is_dir() && rules.is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    Ok(Some(files))
}

/// Classifies by folder first, then by content.
///
/// Only the directories between `root` and the file are considered, so a
/// root that happens to be named `screens` does not force every file into
/// one class.
pub fn classify(
    root: &Path,
    file: &Path,
    rules: &RuleTables,
    content: impl FnOnce() -> Option<String>,
) -> SourceClass {
    if let Some(class) = classify_by_folder(root, file, rules) {
        return class;
    }
    match content() {
        Some(text) if looks_like_screen(&text) => SourceClass::Screen,
        _ => SourceClass::Component,
    }
}

fn classify_by_folder(root: &Path, file: &Path, rules: &RuleTables) -> Option<SourceClass> {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let segments: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let matches = |hints: &[String]| {
        segments
            .iter()
            .any(|segment| hints.iter().any(|hint| segment.contains(hint.as_str())))
    };

    if matches(&rules.screen_folder_hints) {
        Some(SourceClass::Screen)
    } else if matches(&rules.component_folder_hints) {
        Some(SourceClass::Component)
    } else {
        None
    }
}

/// A leading `Screen(` invocation or an active-screen reference.
pub fn looks_like_screen(content: &str) -> bool {
    LEADING_SCREEN_RE.is_match(content) || content.contains(ACTIVE_SCREEN_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_hints_win_over_content() {
        let rules = RuleTables::default();
        let root = Path::new("/src");
        let class = classify(root, Path::new("/src/screens/Home.fx"), &rules, || {
            panic!("content should not be read")
        });
        assert_eq!(class, SourceClass::Screen);

        let class = classify(root, Path::new("/src/MyComponents/Card.fx"), &rules, || {
            Some("Screen(Fill: Color.White)".into())
        });
        assert_eq!(class, SourceClass::Component);
    }

    #[test]
    fn test_root_name_is_not_a_hint() {
        let root = Path::new("/work/screens");
        let class = classify(root, Path::new("/work/screens/Card.fx"), &RuleTables::default(), || {
            Some("Rectangle(Fill: Color.Red)".into())
        });
        assert_eq!(class, SourceClass::Component);
    }

    #[test]
    fn test_content_inference() {
        assert!(looks_like_screen("\n  Screen(\n  Fill: Color.White)"));
        assert!(looks_like_screen("Label(Visible: App.ActiveScreen = Home)"));
        assert!(!looks_like_screen("Label(Text: \"Screen(\")"));
    }
}
