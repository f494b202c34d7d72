//! Lazy instance streams and batch persistence.

use certlab_kernel::{
    format_timestamp, Certificate, CertificateMetadata, ClaimType, GeneratorInfo, Instance,
    InstanceId, Payload,
};
use certlab_store::{InstanceStore, PutOutcome};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::models::{self, Sample};
use crate::GenerateError;

/// Tool name recorded in instance provenance.
pub const GENERATOR_TOOL: &str = "certlab-gen";

/// Deterministic stream of the instances described by a configuration.
///
/// Cloning the stream forks it: both halves yield the same remaining
/// instances.
#[derive(Debug, Clone)]
pub struct Instances<'a> {
    config: &'a GeneratorConfig,
    id_prefix: String,
    rng: ChaCha20Rng,
    next_index: u32,
}

impl<'a> Instances<'a> {
    fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            id_prefix: config.id_prefix(),
            rng: ChaCha20Rng::seed_from_u64(config.seed),
            next_index: 0,
        }
    }

    /// Next instance together with its planted clique, if the model plants one.
    fn next_sample(&mut self) -> Option<Result<(Instance, Option<Vec<u32>>), GenerateError>> {
        if self.next_index >= self.config.count {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        let Sample { graph, planted } =
            models::sample(&mut self.rng, self.config.vertices, &self.config.model);
        Some(self.build(index, graph).map(|instance| (instance, planted)))
    }

    fn build(&self, index: u32, graph: certlab_kernel::Graph) -> Result<Instance, GenerateError> {
        let config = self.config;
        let raw_id = format!("{}-{:04}", self.id_prefix, index);
        let id = InstanceId::parse(&raw_id)
            .map_err(|e| GenerateError::InvalidConfiguration(e.to_string()))?;
        let instance = Instance::new(
            id,
            config.seed,
            index,
            config.created_at,
            GeneratorInfo {
                tool: GENERATOR_TOOL.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                model: config.model.name().to_string(),
                parameters: config.model.parameters(config.vertices),
            },
            Payload::Graph(graph),
        );
        debug!(
            id = %instance.id,
            edges = instance.graph().map_or(0, |g| g.edge_count()),
            "instance generated"
        );
        Ok(instance)
    }
}

impl Iterator for Instances<'_> {
    type Item = Result<Instance, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample()
            .map(|sample| sample.map(|(instance, _)| instance))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.config.count - self.next_index) as usize;
        (left, Some(left))
    }
}

/// Validate `config` and return its instance stream.
///
/// # Parameters
/// - `config`: Batch description; the seed is the only source of randomness.
///
/// # Returns
/// A lazy iterator of exactly `config.count` instances. Calling this again
/// with an equal configuration yields a byte-identical sequence.
pub fn generate(config: &GeneratorConfig) -> Result<Instances<'_>, GenerateError> {
    config.validate()?;
    Ok(Instances::new(config))
}

/// One persisted instance in a [`GenerationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedEntry {
    pub id: InstanceId,
    pub payload_sha256: String,
}

/// Summary of a [`write_batch`] run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub config: GeneratorConfig,
    /// Records newly written by this run.
    pub written: usize,
    /// Records that were already present with identical bytes.
    pub unchanged: usize,
    pub instances: Vec<GeneratedEntry>,
}

/// Generate a batch and persist every instance into `store`.
///
/// Each instance is stored all-or-nothing; the first store failure aborts the
/// batch and is returned as [`GenerateError::Write`]. Instances stored before
/// the failure stay in place and are reproduced identically by a rerun.
pub fn write_batch<S>(
    config: &GeneratorConfig,
    store: &mut S,
) -> Result<GenerationReport, GenerateError>
where
    S: InstanceStore + ?Sized,
{
    let mut report = GenerationReport {
        config: config.clone(),
        written: 0,
        unchanged: 0,
        instances: Vec::with_capacity(config.count as usize),
    };
    for instance in generate(config)? {
        let instance = instance?;
        match store.put(&instance)? {
            PutOutcome::Written => report.written += 1,
            PutOutcome::Unchanged => report.unchanged += 1,
        }
        report.instances.push(GeneratedEntry {
            id: instance.id,
            payload_sha256: instance.payload_sha256,
        });
    }
    info!(
        model = config.model.name(),
        seed = config.seed,
        written = report.written,
        unchanged = report.unchanged,
        "batch generated"
    );
    Ok(report)
}

/// Companion `clique` certificates for the planted cliques of a batch.
///
/// # Returns
/// One certificate per instance for `planted_clique` configurations, an empty
/// list for every other model.
pub fn planted_certificates(config: &GeneratorConfig) -> Result<Vec<Certificate>, GenerateError> {
    let mut stream = generate(config)?;
    let mut certificates = Vec::new();
    while let Some(sample) = stream.next_sample() {
        let (instance, planted) = sample?;
        let Some(clique) = planted else {
            continue;
        };
        let bound = clique.len() as u64;
        certificates.push(
            Certificate::new(instance.id, ClaimType::Clique, Some(bound), json!({ "vertices": clique }))
                .with_metadata(CertificateMetadata {
                    producer: Some(format!("{GENERATOR_TOOL} {}", env!("CARGO_PKG_VERSION"))),
                    produced_at: Some(format_timestamp(config.created_at)),
                    notes: Some("planted clique".to_string()),
                }),
        );
    }
    Ok(certificates)
}
