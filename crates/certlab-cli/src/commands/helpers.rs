//! Shared helpers for command implementations.

use std::fs;
use std::path::Path;

use certlab_kernel::{Certificate, VerificationResult};
use miette::{Context, IntoDiagnostic};
use serde::Serialize;

/// Write `value` as pretty JSON, creating parent directories as needed.
pub(crate) fn write_json_report<T: Serialize>(path: &Path, value: &T) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
    }
    let mut json = serde_json::to_string_pretty(value).into_diagnostic()?;
    json.push('\n');
    fs::write(path, json)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write JSON report {}", path.display()))?;
    Ok(())
}

pub(crate) fn read_text(path: &Path, what: &str) -> miette::Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {what} {}", path.display()))
}

/// Load certificates from a `.json` file or a `.jsonl` batch.
pub(crate) fn load_certificates(path: &Path) -> miette::Result<Vec<Certificate>> {
    let text = read_text(path, "certificate file")?;
    let decoded = if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
        Certificate::from_jsonl(&text)
    } else {
        Certificate::from_json(&text).map(|certificate| vec![certificate])
    };
    decoded
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot use certificate file {}", path.display()))
}

/// One stdout line per verified certificate.
pub(crate) fn verdict_line(result: &VerificationResult) -> String {
    match &result.failure_reason {
        None => format!(
            "[PASS] {} {}: certificate is valid",
            result.instance_id, result.claim_type
        ),
        Some(reason) => format!(
            "[FAIL] {} {}: {}",
            result.instance_id, result.claim_type, reason
        ),
    }
}
