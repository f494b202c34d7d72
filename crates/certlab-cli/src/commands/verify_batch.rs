//! `certlab verify-batch`

use std::path::{Path, PathBuf};

use certlab_kernel::{ClaimType, InstanceId, VerificationResult};
use certlab_store::{default_workers, verify_batch, DirStore};
use miette::IntoDiagnostic;
use serde::Serialize;

use crate::commands::helpers::{load_certificates, verdict_line, write_json_report};

#[derive(Debug, Serialize)]
struct BatchEntry {
    instance_id: InstanceId,
    claim_type: ClaimType,
    /// `pass`, `fail` or `error`.
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<VerificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchReport {
    store: String,
    workers: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    overall: &'static str,
    entries: Vec<BatchEntry>,
}

pub(crate) fn run_verify_batch_command(
    store_root: &Path,
    certificate_paths: &[PathBuf],
    workers: Option<usize>,
    json_report: Option<&Path>,
) -> miette::Result<()> {
    let store = DirStore::open(store_root).into_diagnostic()?;
    let mut certificates = Vec::new();
    for path in certificate_paths {
        certificates.extend(load_certificates(path)?);
    }
    if certificates.is_empty() {
        miette::bail!("Batch verification FAILED: the inputs contain no certificates.");
    }
    let workers = workers.unwrap_or_else(default_workers).max(1);
    let outcomes = verify_batch(&store, &certificates, workers);

    let mut report = BatchReport {
        store: store_root.display().to_string(),
        workers,
        passed: 0,
        failed: 0,
        errors: 0,
        overall: "fail",
        entries: Vec::with_capacity(outcomes.len()),
    };
    for (certificate, outcome) in certificates.iter().zip(outcomes) {
        let entry = match outcome {
            Ok(result) => {
                println!("{}", verdict_line(&result));
                let status = if result.verdict {
                    report.passed += 1;
                    "pass"
                } else {
                    report.failed += 1;
                    "fail"
                };
                BatchEntry {
                    instance_id: certificate.instance_id.clone(),
                    claim_type: certificate.claim_type,
                    status,
                    result: Some(result),
                    error: None,
                }
            }
            Err(err) => {
                println!(
                    "[ERROR] {} {}: {}",
                    certificate.instance_id, certificate.claim_type, err
                );
                report.errors += 1;
                BatchEntry {
                    instance_id: certificate.instance_id.clone(),
                    claim_type: certificate.claim_type,
                    status: "error",
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        };
        report.entries.push(entry);
    }
    if report.failed == 0 && report.errors == 0 {
        report.overall = "pass";
    }

    println!(
        "Batch summary: {} passed, {} failed, {} errors",
        report.passed, report.failed, report.errors
    );
    if let Some(path) = json_report {
        write_json_report(path, &report)?;
        println!("JSON report written to {}", path.display());
    }

    if report.overall == "pass" {
        println!("Batch verification PASSED.");
        Ok(())
    } else {
        miette::bail!("Batch verification FAILED.");
    }
}
