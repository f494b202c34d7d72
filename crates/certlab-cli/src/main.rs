#![doc = include_str!("../README.md")]

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => commands::generate::run_generate_command(args)?,
        Commands::Verify {
            instance,
            certificate,
            json_report,
        } => commands::verify::run_verify_command(&instance, &certificate, json_report.as_deref())?,
        Commands::VerifyBatch {
            store,
            certificates,
            workers,
            json_report,
        } => commands::verify_batch::run_verify_batch_command(
            &store,
            &certificates,
            workers,
            json_report.as_deref(),
        )?,
        Commands::Inspect { instance } => commands::inspect::run_inspect_command(&instance)?,
    }
    Ok(())
}
