//! Best-effort unpack through the external platform CLI.
//!
//! Nothing here can fail validation. A missing tool, a non-zero exit and a
//! timeout all degrade to warnings.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use fxpack_core::{ErrorCategory, Findings, ValidationWarning, ValidatorOptions};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Runs `<cli> canvas unpack --msapp <package> --sources <scratch>`.
pub fn run_unpack_smoke_test(package: &Path, options: &ValidatorOptions, findings: &mut Findings) {
    let location = package.display().to_string();

    let Ok(executable) = which::which(&options.external_cli) else {
        warn!(cli = %options.external_cli, "external CLI not found; skipping unpack smoke test");
        findings.warning(
            ValidationWarning::new(format!(
                "Power Platform CLI ({}) not available. Skipping unpack smoke test.",
                options.external_cli
            ))
            .with_category(ErrorCategory::Dependency)
            .with_file(location),
        );
        return;
    };

    if let Err(reason) = unpack(&executable, package, options) {
        warn!(package = %location, %reason, "external unpack failed");
        findings.warning(
            ValidationWarning::new(format!(
                "Power Platform CLI failed to unpack package: {reason}"
            ))
            .with_category(ErrorCategory::Validation)
            .with_file(location),
        );
    }
}

fn unpack(executable: &Path, package: &Path, options: &ValidatorOptions) -> Result<(), String> {
    // Removed on drop, including the early returns below.
    let scratch = tempfile::Builder::new()
        .prefix("msapp-unpack-")
        .tempdir()
        .map_err(|e| format!("failed to create scratch directory: {e}"))?;

    let mut child = Command::new(executable)
        .args(["canvas", "unpack", "--msapp"])
        .arg(package)
        .arg("--sources")
        .arg(scratch.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start: {e}"))?;

    // Drain stderr while waiting so a chatty child cannot block on a full pipe.
    let stderr_thread = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let timeout = Duration::from_secs(options.smoke_test_timeout_secs);
    let status = match child.wait_timeout(timeout).map_err(|e| e.to_string())? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(format!("timed out after {}s", timeout.as_secs()));
        }
    };

    debug!(?status, scratch = %scratch.path().display(), "external unpack finished");
    if status.success() {
        return Ok(());
    }

    let stderr = stderr_thread
        .and_then(|t| t.join().ok())
        .map(|buf| summarize_stderr(&String::from_utf8_lossy(&buf)))
        .unwrap_or_default();
    Err(if stderr.is_empty() {
        format!("exited with {status}")
    } else {
        format!("exited with {status}: {stderr}")
    })
}

/// Last non-empty line of the child's stderr, where CLIs put the reason.
fn summarize_stderr(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}
