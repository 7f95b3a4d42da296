//! Host tool lookup.

use fxpack_core::{DependencyReport, ValidatorOptions};
use tracing::debug;

/// Looks up the platform CLI, `git` and `zip` on `PATH`.
pub fn check_dependencies(options: &ValidatorOptions) -> DependencyReport {
    let tools = [
        (
            options.external_cli.as_str(),
            format!(
                "Power Platform CLI ({}) - Install from https://aka.ms/PowerPlatformCLI",
                options.external_cli
            ),
        ),
        ("git", "Git".to_string()),
        ("zip", "zip utility".to_string()),
    ];

    let missing = tools
        .into_iter()
        .filter(|(command, _)| {
            let found = which::which(command).is_ok();
            debug!(command, found, "dependency lookup");
            !found
        })
        .map(|(_, label)| label)
        .collect();

    DependencyReport::from_parts(missing, Vec::new())
}
