//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certlab")]
#[command(about = "Reproducible graph instance generation and certificate verification")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Generate a seeded batch of instances into a store directory
    Generate(GenerateArgs),

    /// Verify one certificate against one instance file
    Verify {
        /// Instance record (JSON)
        #[arg(long)]
        instance: PathBuf,

        /// Certificate record (JSON)
        #[arg(long)]
        certificate: PathBuf,

        /// Optional JSON report output path
        #[arg(long)]
        json_report: Option<PathBuf>,
    },

    /// Verify many certificates against a store directory in parallel
    VerifyBatch {
        /// Store directory holding the referenced instances
        #[arg(long)]
        store: PathBuf,

        /// Certificate files (`.json`) or JSON Lines batches (`.jsonl`)
        #[arg(required = true)]
        certificates: Vec<PathBuf>,

        /// Worker threads (default: available parallelism)
        #[arg(long)]
        workers: Option<usize>,

        /// Optional JSON report output path
        #[arg(long)]
        json_report: Option<PathBuf>,
    },

    /// Re-validate an instance file and print its provenance
    Inspect {
        /// Instance record (JSON)
        #[arg(long)]
        instance: PathBuf,
    },
}

#[derive(Args)]
pub(crate) struct GenerateArgs {
    /// Store directory (created if missing)
    #[arg(long)]
    pub(crate) store: PathBuf,

    /// Number of instances
    #[arg(long, required_unless_present = "config")]
    pub(crate) count: Option<u32>,

    /// Vertices per graph
    #[arg(long, required_unless_present = "config")]
    pub(crate) vertices: Option<u32>,

    /// Seed of the random stream
    #[arg(long, required_unless_present = "config")]
    pub(crate) seed: Option<u64>,

    /// Random graph model [default: gnp]
    #[arg(long, value_enum)]
    pub(crate) model: Option<ModelArg>,

    /// Edge probability for gnp and planted-clique [default: 0.5]
    #[arg(long)]
    pub(crate) edge_probability: Option<f64>,

    /// Exact edge count for gnm
    #[arg(long)]
    pub(crate) edges: Option<u64>,

    /// Planted clique size for planted-clique
    #[arg(long)]
    pub(crate) clique_size: Option<u32>,

    /// RFC 3339 timestamp written into every record
    #[arg(long)]
    pub(crate) created_at: Option<String>,

    /// Generator configuration JSON (replaces the batch flags)
    #[arg(
        long,
        conflicts_with_all = [
            "count",
            "vertices",
            "seed",
            "model",
            "edge_probability",
            "edges",
            "clique_size",
        ]
    )]
    pub(crate) config: Option<PathBuf>,

    /// Directory for planted-clique certificates
    #[arg(long)]
    pub(crate) certificates: Option<PathBuf>,

    /// Optional JSON report output path
    #[arg(long)]
    pub(crate) json_report: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModelArg {
    Gnp,
    Gnm,
    PlantedClique,
}
