use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fxpack_core::{ParsedSources, ToolConfig, ValidationResult};
use fxpack_parser::SourceParser;
use fxpack_validator::PackageValidator;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "fxpack")]
#[command(about = "Parse and validate Power Apps formula sources and .msapp packages")]
#[command(version = PACKAGE_VERSION)]
struct Cli {
    /// YAML tool configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log progress to stderr (RUST_LOG overrides the level).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a source directory into screens and components.
    Parse(ParseArgs),
    /// Check the syntax of individual .fx files.
    CheckSyntax(CheckSyntaxArgs),
    /// Validate a source directory before packaging.
    ValidateSource(DirArgs),
    /// Validate one or more built .msapp packages.
    ValidatePackage(ValidatePackageArgs),
    /// Source validation, dependency lookup and a trial parse.
    DryRun(DirArgs),
    /// Report which external tools are available.
    Deps(FormatArgs),
}

#[derive(Debug, Args)]
struct FormatArgs {
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Source directory.
    dir: PathBuf,
    /// Place nested controls under their parents.
    #[arg(long)]
    nested: bool,
    /// Fail on the first syntax error instead of recording it.
    #[arg(long)]
    strict: bool,
    #[command(flatten)]
    output: FormatArgs,
}

#[derive(Debug, Args)]
struct CheckSyntaxArgs {
    /// Source files to check.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[command(flatten)]
    output: FormatArgs,
}

#[derive(Debug, Args)]
struct DirArgs {
    /// Source directory.
    dir: PathBuf,
    #[command(flatten)]
    output: FormatArgs,
}

#[derive(Debug, Args)]
struct ValidatePackageArgs {
    /// Package files to validate.
    #[arg(required = true)]
    packages: Vec<PathBuf>,
    /// Skip the unpack smoke test with the external platform CLI.
    #[arg(long)]
    no_smoke_test: bool,
    /// Add file-name advisories for import tooling.
    #[arg(long)]
    import_compat: bool,
    /// Number of parallel validation jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    #[command(flatten)]
    output: FormatArgs,
}

/// One checked target and its result.
#[derive(Debug, Serialize)]
struct TargetReport {
    target: String,
    #[serde(flatten)]
    result: ValidationResult,
}

/// Reports for a batch run, stamped with when it ran.
#[derive(Debug, Serialize)]
struct RunSummary {
    generated_at: String,
    checked: usize,
    valid: usize,
    reports: Vec<TargetReport>,
}

impl RunSummary {
    fn new(reports: Vec<TargetReport>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            checked: reports.len(),
            valid: reports.iter().filter(|r| r.result.is_valid()).count(),
            reports,
        }
    }

    fn failed(&self) -> usize {
        self.checked - self.valid
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Parse(args) => run_parse(&config, args),
        Command::CheckSyntax(args) => run_check_syntax(&config, args),
        Command::ValidateSource(args) => run_validate_source(&config, args),
        Command::ValidatePackage(args) => run_validate_package(config, args),
        Command::DryRun(args) => run_dry_run(&config, args),
        Command::Deps(args) => run_deps(&config, args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ToolConfig, String> {
    match path {
        Some(path) => ToolConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(ToolConfig::default()),
    }
}

fn source_parser(config: &ToolConfig) -> SourceParser {
    SourceParser::new()
        .with_rules(config.rule_tables())
        .with_options(config.parser.clone())
}

// ---------------------------------------------------------------------------
// parse / check-syntax
// ---------------------------------------------------------------------------

fn run_parse(config: &ToolConfig, args: ParseArgs) -> Result<(), String> {
    let mut options = config.parser.clone();
    options.nested_controls |= args.nested;
    options.strict_syntax |= args.strict;
    let parser = source_parser(config).with_options(options);

    let parsed = parser
        .parse_directory(&args.dir)
        .map_err(|e| e.formatted())?;

    match args.output.format {
        CliOutputFormat::Table => print!("{}", format_parsed_table(&parsed)),
        format => println!("{}", serialize(&parsed, format)?),
    }
    Ok(())
}

fn run_check_syntax(config: &ToolConfig, args: CheckSyntaxArgs) -> Result<(), String> {
    let parser = source_parser(config);
    let reports = args
        .files
        .iter()
        .map(|file| {
            let content = fs::read_to_string(file)
                .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
            Ok(TargetReport {
                target: file.display().to_string(),
                result: parser.validate_syntax(&content),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    emit_summary(RunSummary::new(reports), args.output.format)
}

// ---------------------------------------------------------------------------
// validate-source / validate-package / dry-run / deps
// ---------------------------------------------------------------------------

fn run_validate_source(config: &ToolConfig, args: DirArgs) -> Result<(), String> {
    let validator = PackageValidator::from_config(config);
    let report = TargetReport {
        target: args.dir.display().to_string(),
        result: validator.validate_source_code(&args.dir),
    };
    emit_summary(RunSummary::new(vec![report]), args.output.format)
}

fn run_validate_package(mut config: ToolConfig, args: ValidatePackageArgs) -> Result<(), String> {
    if args.no_smoke_test {
        config.validator.run_external_smoke_test = false;
    }
    let validator = PackageValidator::from_config(&config);

    let validate_all = || {
        args.packages
            .par_iter()
            .map(|package| {
                let result = if args.import_compat {
                    validator.validate_import_compatibility(package)
                } else {
                    validator.validate_package(package)
                };
                result
                    .map(|result| TargetReport {
                        target: package.display().to_string(),
                        result,
                    })
                    .map_err(|e| e.formatted())
            })
            .collect::<Result<Vec<_>, String>>()
    };

    let reports = match args.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| format!("Failed to build thread pool: {e}"))?
            .install(validate_all)?,
        None => validate_all()?,
    };

    emit_summary(RunSummary::new(reports), args.output.format)
}

fn run_dry_run(config: &ToolConfig, args: DirArgs) -> Result<(), String> {
    let validator = PackageValidator::from_config(config);
    let report = TargetReport {
        target: args.dir.display().to_string(),
        result: validator.dry_run_validation(&args.dir),
    };
    emit_summary(RunSummary::new(vec![report]), args.output.format)
}

fn run_deps(config: &ToolConfig, args: FormatArgs) -> Result<(), String> {
    let report = PackageValidator::from_config(config).check_dependencies();
    match args.format {
        CliOutputFormat::Table => {
            if report.satisfied {
                println!("All dependencies available.");
            }
            for missing in &report.missing {
                println!("missing: {missing}");
            }
            for conflict in &report.conflicts {
                println!("conflict: {conflict}");
            }
        }
        format => println!("{}", serialize(&report, format)?),
    }
    if report.satisfied {
        Ok(())
    } else {
        Err(format!("{} dependency(ies) missing", report.missing.len()))
    }
}

// ---------------------------------------------------------------------------
// output
// ---------------------------------------------------------------------------

fn emit_summary(summary: RunSummary, format: CliOutputFormat) -> Result<(), String> {
    match format {
        CliOutputFormat::Table => print!("{}", format_summary_table(&summary)),
        format => println!("{}", serialize(&summary, format)?),
    }
    match summary.failed() {
        0 => Ok(()),
        failed => Err(format!("{failed} of {} target(s) failed validation", summary.checked)),
    }
}

fn serialize<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        CliOutputFormat::Table => Err("table output is not supported here".to_string()),
    }
}

fn location(file: Option<&str>, line: Option<usize>, column: Option<usize>) -> String {
    match (file, line, column) {
        (Some(file), Some(line), Some(column)) => format!("{file}:{line}:{column}: "),
        (Some(file), Some(line), None) => format!("{file}:{line}: "),
        (Some(file), None, _) => format!("{file}: "),
        (None, Some(line), Some(column)) => format!("{line}:{column}: "),
        _ => String::new(),
    }
}

fn format_summary_table(summary: &RunSummary) -> String {
    let mut out = String::new();
    for report in &summary.reports {
        let status = if report.result.is_valid() { "OK" } else { "FAILED" };
        out.push_str(&format!("{status:<7}{}\n", report.target));
        for error in report.result.errors() {
            out.push_str(&format!(
                "  error [{}] {}{}\n",
                error.category,
                location(error.file.as_deref(), error.line, error.column),
                error.message
            ));
        }
        for warning in report.result.warnings() {
            let category = warning
                .category
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  warning{category} {}{}\n",
                location(warning.file.as_deref(), warning.line, warning.column),
                warning.message
            ));
        }
    }
    out.push_str(&format!(
        "\n{} checked, {} valid, {} failed ({})\n",
        summary.checked,
        summary.valid,
        summary.failed(),
        summary.generated_at
    ));
    out
}

fn format_parsed_table(parsed: &ParsedSources) -> String {
    let mut out = String::new();
    out.push_str(&format!("Screens ({})\n", parsed.screens.len()));
    for screen in &parsed.screens {
        out.push_str(&format!(
            "  {:<24} controls={:<3} formulas={:<3} {}\n",
            screen.name,
            screen.controls.len(),
            screen.formulas.len(),
            screen.file
        ));
    }
    out.push_str(&format!("Components ({})\n", parsed.components.len()));
    for component in &parsed.components {
        out.push_str(&format!(
            "  {:<24} custom_properties={:<3} {}\n",
            component.name,
            component.custom_properties.len(),
            component.file
        ));
    }
    out
}
