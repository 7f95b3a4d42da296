//! Pattern-based guardrails for common import blockers.
//!
//! Each check is an independent pure function over the same loaded file set.
//! They never look at each other's output, so any of them can be added or
//! removed from [`CHECKS`] without touching the rest.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use fxpack_core::{Findings, RuleTables, ValidationError, ValidationWarning};
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One formula source file loaded for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the analyzed root, `/`-separated.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub content: String,
}

impl SourceFile {
    fn file_name_lower(&self) -> String {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    fn location(&self) -> String {
        self.absolute_path.display().to_string()
    }
}

/// Signature shared by every heuristic.
pub type HeuristicCheck = fn(&[SourceFile], &RuleTables) -> Findings;

/// The checks run by [`analyze_files`], in order.
pub const CHECKS: &[HeuristicCheck] = &[
    check_startup_file,
    check_start_screen,
    check_map_fallback,
    check_review_pass_fail,
    check_outcome_override,
    check_publish_guardrails,
    check_export_feedback,
    check_audit_trail,
];

static SEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ClearCollect\s*\(|Collect\s*\(").expect("static regex must compile")
});
static START_SCREEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"StartScreen\s*:\s*([^\r\n,]+)").expect("static regex must compile")
});
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("static regex must compile"));
static MAP_FALLBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)If\s*\(\s*IsBlank\s*\(\s*txtWebMapId\.Text").expect("static regex must compile")
});
static THRESHOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)TargetMin|AllowedValues").expect("static regex must compile"));
static JUSTIFICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Notify\s*\(\s*"Justification is required"#).expect("static regex must compile")
});
static PUBLISH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Publish").expect("static regex must compile"));
static EXPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Export").expect("static regex must compile"));
static ON_SELECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)OnSelect").expect("static regex must compile"));
static PUBLISH_GUARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Notify\s*\(\s*"Missing required|IsBlank\s*\(\s*ddSite\.Selected"#)
        .expect("static regex must compile")
});
static EXPORT_FEEDBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Notify\s*\(\s*"(?:Export generated|Excel exported)"#)
        .expect("static regex must compile")
});
static AUDIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)colAudit").expect("static regex must compile"));

/// Loads every source file under `dir`, sorted by path.
///
/// Unreadable files are skipped with a warning log.
pub fn load_source_files(dir: &Path, rules: &RuleTables) -> Vec<SourceFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !rules.is_source_file(entry.path()) {
            continue;
        }

        let absolute_path = entry.into_path();
        let content = match std::fs::read_to_string(&absolute_path) {
            Ok(content) => content,
            Err(err) => {
                warn!(file = %absolute_path.display(), error = %err, "skipping unreadable source file");
                continue;
            }
        };
        files.push(SourceFile {
            relative_path: relative_display(dir, &absolute_path),
            absolute_path,
            content,
        });
    }

    files
}

/// `/`-separated path of `path` relative to `root`.
pub(crate) fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Loads `dir` and runs every check over it.
pub fn analyze_directory(dir: &Path, rules: &RuleTables) -> Findings {
    let files = load_source_files(dir, rules);
    analyze_files(&files, rules)
}

/// Runs every check in [`CHECKS`] over `files`. No files, no findings.
pub fn analyze_files(files: &[SourceFile], rules: &RuleTables) -> Findings {
    let mut findings = Findings::new();
    if files.is_empty() {
        return findings;
    }

    for check in CHECKS {
        findings.absorb(check(files, rules));
    }

    debug!(
        files = files.len(),
        errors = findings.errors.len(),
        warnings = findings.warnings.len(),
        "heuristic pass finished"
    );
    findings
}

/// Startup logic must live in `App.OnStart.fx` and seed data.
pub fn check_startup_file(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    let mut findings = Findings::new();
    let on_start: Vec<&SourceFile> = files
        .iter()
        .filter(|f| f.file_name_lower() == "app.onstart.fx")
        .collect();

    let Some(first) = on_start.first() else {
        findings.error(ValidationError::validation(
            "App.OnStart.fx not found. Move your startup formula into App.OnStart and enable \
             Enhanced App OnStart so collections seed correctly.",
        ));
        return findings;
    };

    if !on_start.iter().any(|f| SEED_RE.is_match(&f.content)) {
        findings.warning(
            ValidationWarning::new(
                "App.OnStart does not seed data. Add ClearCollect/Collect guards so demo data \
                 and KPIs appear when the app loads.",
            )
            .with_file(first.location()),
        );
    }
    findings
}

/// `StartScreen` in `App.fx` must name a screen, not run behavior.
pub fn check_start_screen(files: &[SourceFile], rules: &RuleTables) -> Findings {
    let mut findings = Findings::new();
    let Some(app) = files.iter().find(|f| f.file_name_lower() == "app.fx") else {
        return findings;
    };
    let Some(formula) = START_SCREEN_RE
        .captures(&app.content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    else {
        return findings;
    };

    if contains_behavior_call(formula, &rules.behavior_functions) || formula.contains(';') {
        findings.error(
            ValidationError::validation(
                "StartScreen contains behavior formulas. Keep StartScreen to a single screen name \
                 and move Set/Collect/Navigate calls into App.OnStart or button handlers.",
            )
            .with_file(app.location()),
        );
        return findings;
    }

    if !IDENTIFIER_RE.is_match(formula) {
        findings.warning(
            ValidationWarning::new(
                "StartScreen should resolve to a screen symbol. If dynamic logic is required, \
                 compute it in App.OnStart and reference a variable here.",
            )
            .with_file(app.location()),
        );
    }
    findings
}

/// Case-insensitive `Name(` search; `Reset(` counts as `Set(`.
fn contains_behavior_call(formula: &str, behavior_functions: &[String]) -> bool {
    let haystack = formula.to_ascii_lowercase();
    behavior_functions.iter().any(|name| {
        let needle = name.to_ascii_lowercase();
        haystack
            .match_indices(&needle)
            .any(|(idx, _)| haystack[idx + needle.len()..].trim_start().starts_with('('))
    })
}

/// Web map ids need a fallback image.
pub fn check_map_fallback(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    guard_check(
        files,
        |f| f.content.contains("txtWebMapId"),
        |f| MAP_FALLBACK_RE.is_match(&f.content) || f.content.contains("varMapImageUrl"),
        "Map screen references txtWebMapId without a fallback image. Provide a placeholder via \
         varMapImageUrl so exports do not break.",
    )
}

/// Review screens need threshold-driven Pass/Fail.
pub fn check_review_pass_fail(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    guard_check(
        files,
        |f| f.content.contains("colObservations") || f.content.contains("colAttributes"),
        |f| {
            f.content.contains("\"Pass\"")
                && f.content.contains("\"Fail\"")
                && THRESHOLD_RE.is_match(&f.content)
        },
        "Review screens should derive Pass/Fail from attribute thresholds. Use \
         LookUp(colAttributes, ...) with TargetMin/TargetMax or AllowedValues.",
    )
}

/// Outcome overrides need a justification guard.
pub fn check_outcome_override(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    guard_check(
        files,
        |f| f.content.contains("varSuggested") || f.content.contains("tglOverride"),
        |f| JUSTIFICATION_RE.is_match(&f.content) || f.content.contains("tglOverride.Value"),
        "Outcome override lacks justification guardrails. Require tglOverride + justification \
         before Patch/Collect executes.",
    )
}

/// Publish handlers need pre-flight validation.
pub fn check_publish_guardrails(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    guard_check(
        files,
        |f| PUBLISH_RE.is_match(&f.content) && ON_SELECT_RE.is_match(&f.content),
        |f| PUBLISH_GUARD_RE.is_match(&f.content),
        "Publish button lacks pre-flight validation. Block the action when Site, Feature, \
         WebMap Id or reviewers are missing and show Notify().",
    )
}

/// Export handlers need user feedback.
pub fn check_export_feedback(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    guard_check(
        files,
        |f| EXPORT_RE.is_match(&f.content) && ON_SELECT_RE.is_match(&f.content),
        |f| EXPORT_FEEDBACK_RE.is_match(&f.content),
        "Export buttons do not provide feedback. Surface a Notify() with a fake download URL to \
         keep demo flows moving.",
    )
}

/// Some file must keep a `colAudit` collection.
pub fn check_audit_trail(files: &[SourceFile], _rules: &RuleTables) -> Findings {
    let mut findings = Findings::new();
    if files.iter().any(|f| AUDIT_RE.is_match(&f.content)) {
        return findings;
    }
    if let Some(first) = files.first() {
        findings.warning(
            ValidationWarning::new(
                "No audit telemetry detected. Create a colAudit collection and log \
                 Publish/Outcome actions so Diagnostics can show recent activity.",
            )
            .with_file(first.location()),
        );
    }
    findings
}

/// Warns once, on the first relevant file, when no relevant file carries the guard.
fn guard_check(
    files: &[SourceFile],
    relevant: impl Fn(&SourceFile) -> bool,
    guarded: impl Fn(&SourceFile) -> bool,
    message: &str,
) -> Findings {
    let mut findings = Findings::new();
    let matching: Vec<&SourceFile> = files.iter().filter(|f| relevant(f)).collect();

    if let Some(first) = matching.first() {
        if !matching.iter().any(|f| guarded(f)) {
            findings.warning(ValidationWarning::new(message).with_file(first.location()));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(relative_path: &str, content: &str) -> SourceFile {
        SourceFile {
            relative_path: relative_path.to_string(),
            absolute_path: PathBuf::from("/src").join(relative_path),
            content: content.to_string(),
        }
    }

    fn run(check: HeuristicCheck, files: &[SourceFile]) -> Findings {
        check(files, &RuleTables::default())
    }

    #[test]
    fn test_no_files_no_findings() {
        assert_eq!(analyze_files(&[], &RuleTables::default()), Findings::new());
    }

    #[test]
    fn test_missing_on_start_is_error() {
        let findings = run(check_startup_file, &[file("screens/Home.fx", "Screen()")]);
        assert_eq!(findings.errors.len(), 1);
        assert!(findings.errors[0].message.contains("App.OnStart.fx not found"));
    }

    #[test]
    fn test_on_start_without_seed_is_warning() {
        let findings = run(check_startup_file, &[file("App.OnStart.fx", "Set(varReady, true)")]);
        assert!(findings.errors.is_empty());
        assert!(findings.warnings[0].message.contains("does not seed data"));
        assert_eq!(findings.warnings[0].file.as_deref(), Some("/src/App.OnStart.fx"));

        let seeded = run(
            check_startup_file,
            &[file("app.onstart.fx", "clearcollect(colItems, [1])")],
        );
        assert_eq!(seeded, Findings::new());
    }

    #[test]
    fn test_start_screen_behavior_is_error() {
        for formula in ["Navigate(Home)", "Home; Set(x, 1)", "Reset(Home)"] {
            let content = format!("App(\n    StartScreen: {formula}\n)");
            let findings = run(check_start_screen, &[file("App.fx", &content)]);
            assert_eq!(findings.errors.len(), 1, "{formula}");
            assert!(findings.errors[0].message.contains("StartScreen contains behavior"));
        }
    }

    #[test]
    fn test_start_screen_expression_is_warning() {
        let findings = run(
            check_start_screen,
            &[file("App.fx", "StartScreen: If(varAdmin, Admin, Home)")],
        );
        assert!(findings.errors.is_empty());
        // The value stops at the first comma.
        assert_eq!(findings.warnings.len(), 1);

        let plain = run(check_start_screen, &[file("App.fx", "StartScreen: HomeScreen\n")]);
        assert_eq!(plain, Findings::new());
    }

    #[test]
    fn test_map_fallback() {
        let missing = run(check_map_fallback, &[file("Map.fx", "Text: txtWebMapId.Text")]);
        assert!(missing.warnings[0].message.contains("fallback image"));

        let guarded = run(
            check_map_fallback,
            &[
                file("Map.fx", "Text: txtWebMapId.Text"),
                file("Other.fx", "Image: varMapImageUrl"),
            ],
        );
        // Only files mentioning the map id count as guards.
        assert_eq!(guarded.warnings.len(), 1);

        let guarded = run(
            check_map_fallback,
            &[file("Map.fx", "Image: If(IsBlank(txtWebMapId.Text), varMapImageUrl)")],
        );
        assert!(guarded.warnings.is_empty());
    }

    #[test]
    fn test_review_and_override_guards() {
        let review = run(
            check_review_pass_fail,
            &[file("Review.fx", "Items: colObservations")],
        );
        assert_eq!(review.warnings.len(), 1);

        let review = run(
            check_review_pass_fail,
            &[file(
                "Review.fx",
                "Items: colObservations\nText: If(x >= TargetMin, \"Pass\", \"Fail\")",
            )],
        );
        assert!(review.warnings.is_empty());

        let outcome = run(check_outcome_override, &[file("Outcome.fx", "Default: varSuggested")]);
        assert!(outcome.warnings[0].message.contains("justification"));
        let outcome = run(
            check_outcome_override,
            &[file("Outcome.fx", "Visible: tglOverride.Value")],
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_publish_and_export_guards() {
        let publish = run(
            check_publish_guardrails,
            &[file("Publish.fx", "OnSelect: Patch(colPublish, Defaults(colPublish))")],
        );
        assert_eq!(publish.warnings.len(), 1);
        let publish = run(
            check_publish_guardrails,
            &[file(
                "Publish.fx",
                "OnSelect: If(IsBlank(ddSite.Selected), Notify(\"Missing required\"), Patch(colPublish, {}))",
            )],
        );
        assert!(publish.warnings.is_empty());

        let export = run(check_export_feedback, &[file("Export.fx", "OnSelect: Export()")]);
        assert_eq!(export.warnings.len(), 1);
        let export = run(
            check_export_feedback,
            &[file("Export.fx", "OnSelect: Notify(\"Excel exported to downloads\")")],
        );
        assert!(export.warnings.is_empty());
    }

    #[test]
    fn test_audit_trail_warns_on_first_file() {
        let files = [file("A.fx", "X: 1"), file("B.fx", "Y: 2")];
        let findings = run(check_audit_trail, &files);
        assert_eq!(findings.warnings.len(), 1);
        assert_eq!(findings.warnings[0].file.as_deref(), Some("/src/A.fx"));

        let files = [file("A.fx", "ClearCollect(colAudit, [])")];
        assert!(run(check_audit_trail, &files).warnings.is_empty());
    }

    #[test]
    fn test_analyze_files_runs_every_check() {
        let findings = analyze_files(
            &[file("screens/Home.fx", "Screen(Fill: Color.White)")],
            &RuleTables::default(),
        );
        assert_eq!(findings.errors.len(), 1);
        assert!(findings.warnings.iter().any(|w| w.message.contains("audit telemetry")));
    }
}
