//! `certlab generate`

use std::fs;
use std::path::Path;

use certlab_gen::{planted_certificates, write_batch, GenerateError, GeneratorConfig, GraphModel};
use certlab_kernel::parse_timestamp;
use certlab_store::DirStore;
use chrono::{DateTime, TimeZone, Utc};
use miette::{Context, IntoDiagnostic};
use tracing::{info, warn};

use crate::cli::{GenerateArgs, ModelArg};
use crate::commands::helpers::{read_text, write_json_report};

/// Environment variable honoured for reproducible timestamps.
const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

const DEFAULT_EDGE_PROBABILITY: f64 = 0.5;

pub(crate) fn run_generate_command(args: GenerateArgs) -> miette::Result<()> {
    let config = config_from_args(&args, std::env::var(SOURCE_DATE_EPOCH).ok().as_deref())?;
    config.validate().into_diagnostic()?;
    let context = || format!("Generation into {} failed", args.store.display());
    let mut store = DirStore::create(&args.store)
        .map_err(GenerateError::Write)
        .into_diagnostic()
        .wrap_err_with(context)?;
    let report = write_batch(&config, &mut store)
        .into_diagnostic()
        .wrap_err_with(context)?;

    for entry in &report.instances {
        println!("{}  payload_sha256={}", entry.id, entry.payload_sha256);
    }
    println!(
        "Generated {} instances ({} written, {} unchanged) in {}",
        report.instances.len(),
        report.written,
        report.unchanged,
        store.root().display()
    );

    if let Some(dir) = &args.certificates {
        write_planted_certificates(&config, dir)?;
    }
    if let Some(path) = &args.json_report {
        write_json_report(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn write_planted_certificates(config: &GeneratorConfig, dir: &Path) -> miette::Result<()> {
    let certificates = planted_certificates(config).into_diagnostic()?;
    if certificates.is_empty() {
        warn!(
            model = config.model.name(),
            "model plants no structure; no certificates written"
        );
        return Ok(());
    }
    fs::create_dir_all(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;
    for certificate in &certificates {
        let path = dir.join(format!("{}.clique.json", certificate.instance_id));
        fs::write(&path, certificate.to_json_pretty().into_diagnostic()?)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    }
    info!(count = certificates.len(), dir = %dir.display(), "planted certificates written");
    println!(
        "Wrote {} planted-clique certificates to {}",
        certificates.len(),
        dir.display()
    );
    Ok(())
}

/// Build the batch configuration from flags or a `--config` file.
///
/// `source_date_epoch` is the raw `SOURCE_DATE_EPOCH` value, if set.
pub(crate) fn config_from_args(
    args: &GenerateArgs,
    source_date_epoch: Option<&str>,
) -> miette::Result<GeneratorConfig> {
    let explicit_created_at = args
        .created_at
        .as_deref()
        .map(|raw| {
            parse_timestamp(raw)
                .ok_or_else(|| miette::miette!("--created-at '{raw}' is not an RFC 3339 timestamp"))
        })
        .transpose()?;

    if let Some(path) = &args.config {
        let text = read_text(path, "generator configuration")?;
        let mut config = GeneratorConfig::from_json(&text)
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid configuration file {}", path.display()))?;
        if let Some(created_at) = explicit_created_at {
            config.created_at = created_at;
        }
        return Ok(config);
    }

    let edge_probability = args.edge_probability.unwrap_or(DEFAULT_EDGE_PROBABILITY);
    let model = match args.model.unwrap_or(ModelArg::Gnp) {
        ModelArg::Gnp => GraphModel::Gnp { edge_probability },
        ModelArg::Gnm => GraphModel::Gnm {
            edges: args
                .edges
                .ok_or_else(|| miette::miette!("--edges is required for --model gnm"))?,
        },
        ModelArg::PlantedClique => GraphModel::PlantedClique {
            edge_probability,
            clique_size: args.clique_size.ok_or_else(|| {
                miette::miette!("--clique-size is required for --model planted-clique")
            })?,
        },
    };
    let created_at = match explicit_created_at {
        Some(at) => at,
        None => default_created_at(source_date_epoch)?,
    };
    let (Some(count), Some(vertices), Some(seed)) = (args.count, args.vertices, args.seed) else {
        miette::bail!("--count, --vertices and --seed are required without --config");
    };
    Ok(GeneratorConfig {
        count,
        vertices,
        seed,
        model,
        created_at,
    })
}

fn default_created_at(source_date_epoch: Option<&str>) -> miette::Result<DateTime<Utc>> {
    let seconds = match source_date_epoch {
        Some(raw) => raw.trim().parse::<i64>().into_diagnostic().wrap_err_with(|| {
            format!("{SOURCE_DATE_EPOCH}='{raw}' is not a number of seconds")
        })?,
        None => Utc::now().timestamp(),
    };
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| miette::miette!("timestamp {seconds} is out of range"))
}
