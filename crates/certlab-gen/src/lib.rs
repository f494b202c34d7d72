#![doc = include_str!("../README.md")]

pub mod config;
pub mod generate;
mod models;

pub use config::{GeneratorConfig, GraphModel};
pub use generate::{
    generate, planted_certificates, write_batch, GeneratedEntry, GenerationReport, Instances,
    GENERATOR_TOOL,
};

use certlab_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The configuration cannot describe a batch; nothing was generated.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Persisting an instance failed. Earlier instances of the batch remain
    /// stored; rerunning the same configuration completes the batch.
    #[error("Failed to write instance: {0}")]
    Write(#[from] StoreError),
}
