//! `certlab verify`

use std::path::Path;

use certlab_kernel::{verify, Certificate};
use certlab_store::load_instance_file;
use miette::{Context, IntoDiagnostic};

use crate::commands::helpers::{read_text, verdict_line, write_json_report};

pub(crate) fn run_verify_command(
    instance_path: &Path,
    certificate_path: &Path,
    json_report: Option<&Path>,
) -> miette::Result<()> {
    let instance = load_instance_file(instance_path)
        .into_diagnostic()
        .wrap_err("Cannot verify against this instance")?;
    let certificate = Certificate::from_json(&read_text(certificate_path, "certificate")?)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot use certificate {}", certificate_path.display()))?;
    let result = verify(&instance, &certificate).into_diagnostic()?;

    println!("{}", verdict_line(&result));
    if let Some(path) = json_report {
        write_json_report(path, &result)?;
        println!("JSON report written to {}", path.display());
    }

    if result.verdict {
        Ok(())
    } else {
        miette::bail!("Certificate verification FAILED.");
    }
}
