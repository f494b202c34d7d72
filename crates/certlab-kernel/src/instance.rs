//! Instance records: identified, immutable computational objects with provenance.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::graph::Graph;
use crate::{format_timestamp, hex_digest, parse_timestamp, peek_format_version, KernelError};

/// Current instance record format version.
///
/// Decoders accept exactly this version. A new layout must bump the constant
/// so that historical records are never silently reinterpreted.
pub const INSTANCE_FORMAT_VERSION: u32 = 1;

const PAYLOAD_HASH_DOMAIN_TAG: &str = "certlab-payload-v1\n";

/// Identifier of an instance, also used as its file stem in a directory store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceId(String);

impl InstanceId {
    /// Validate and wrap a raw identifier.
    ///
    /// Ids are non-empty, use only ASCII alphanumerics, `.`, `_` and `-`, and
    /// do not start with `.`, so they are always safe single path components.
    pub fn parse(raw: &str) -> Result<Self, KernelError> {
        let valid = !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(KernelError::InvalidId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InstanceId {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InstanceId> for String {
    fn from(value: InstanceId) -> Self {
        value.0
    }
}

impl FromStr for InstanceId {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Domain payload of an instance, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Graph(Graph),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Graph(_) => "graph",
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            Payload::Graph(graph) => Some(graph),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Payload::Graph(graph) => graph.validate(),
        }
    }

    /// Compute the canonical payload digest.
    ///
    /// The digest covers the domain tag, the payload kind and the canonical
    /// structure only, so it is independent of JSON formatting and of the
    /// provenance fields around the payload.
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(PAYLOAD_HASH_DOMAIN_TAG.as_bytes());
        hasher.update(self.kind().as_bytes());
        hasher.update(b"\n");
        match self {
            Payload::Graph(graph) => {
                hasher.update(format!("vertices={}\n", graph.vertices).as_bytes());
                for (u, v) in &graph.edges {
                    hasher.update(format!("{u}-{v}\n").as_bytes());
                }
            }
        }
        hex_digest(hasher.finalize().as_slice())
    }
}

/// How an instance was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorInfo {
    /// Producing tool (for example `certlab-gen`).
    pub tool: String,
    /// Version of the producing tool.
    pub version: String,
    /// Random model name (`gnp`, `gnm`, `planted_clique`, ...).
    pub model: String,
    /// Model parameters, keyed by name.
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// One instance record as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Instance {
    /// Record format version.
    pub format_version: u32,
    /// Unique instance identifier.
    pub id: InstanceId,
    /// Seed of the batch this instance was drawn from.
    pub seed: u64,
    /// Position of the instance within its batch.
    pub index: u32,
    /// RFC 3339 generation timestamp.
    pub created_at: String,
    /// Producer provenance.
    pub generator: GeneratorInfo,
    /// Domain payload.
    pub payload: Payload,
    /// Canonical digest of `payload`.
    pub payload_sha256: String,
}

impl Instance {
    pub fn new(
        id: InstanceId,
        seed: u64,
        index: u32,
        created_at: DateTime<Utc>,
        generator: GeneratorInfo,
        payload: Payload,
    ) -> Self {
        let payload_sha256 = payload.sha256();
        Self {
            format_version: INSTANCE_FORMAT_VERSION,
            id,
            seed,
            index,
            created_at: format_timestamp(created_at),
            generator,
            payload,
            payload_sha256,
        }
    }

    /// Decode an instance record and check every integrity invariant.
    ///
    /// # Returns
    /// The instance, or an error when the JSON is invalid, the format version
    /// is not [`INSTANCE_FORMAT_VERSION`], or the payload fails validation.
    pub fn from_json(text: &str) -> Result<Self, KernelError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        match peek_format_version(&value) {
            Some(found) if found == u64::from(INSTANCE_FORMAT_VERSION) => {}
            found => {
                return Err(KernelError::UnsupportedFormatVersion {
                    record: "instance",
                    found: found.unwrap_or(0),
                    expected: INSTANCE_FORMAT_VERSION,
                })
            }
        }
        let instance: Instance = serde_json::from_value(value)?;
        instance.validate()?;
        Ok(instance)
    }

    /// Canonical on-disk encoding: pretty JSON plus a trailing newline.
    ///
    /// Field order follows the struct declaration, so equal instances always
    /// encode to identical bytes.
    pub fn to_json_pretty(&self) -> Result<String, KernelError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        let corrupt = |reason: String| KernelError::CorruptInstance {
            id: self.id.to_string(),
            reason,
        };
        self.payload.validate().map_err(corrupt)?;
        if parse_timestamp(&self.created_at).is_none() {
            return Err(corrupt(format!(
                "created_at '{}' is not an RFC 3339 timestamp",
                self.created_at
            )));
        }
        let actual = self.payload.sha256();
        if actual != self.payload_sha256 {
            return Err(corrupt(format!(
                "payload hash mismatch (recorded {}, computed {})",
                self.payload_sha256, actual
            )));
        }
        Ok(())
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.payload.as_graph()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_instance() -> Instance {
        let graph = Graph::from_edges(4, [(0, 1), (2, 3)]).unwrap();
        let mut parameters = BTreeMap::new();
        parameters.insert("edges".to_string(), serde_json::json!(2));
        Instance::new(
            InstanceId::parse("gnm-s7-0000").unwrap(),
            7,
            0,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            GeneratorInfo {
                tool: "certlab-gen".into(),
                version: "0.0.0".into(),
                model: "gnm".into(),
                parameters,
            },
            Payload::Graph(graph),
        )
    }

    #[test]
    fn instance_ids_reject_path_tricks() {
        assert!(InstanceId::parse("gnp-s42-0001").is_ok());
        assert!(InstanceId::parse("").is_err());
        assert!(InstanceId::parse("../escape").is_err());
        assert!(InstanceId::parse(".hidden").is_err());
        assert!(InstanceId::parse("a/b").is_err());
        assert!(InstanceId::parse("with space").is_err());
    }

    #[test]
    fn encoding_round_trips_and_is_stable() {
        let instance = sample_instance();
        let text = instance.to_json_pretty().unwrap();
        assert!(text.ends_with("}\n"));
        let decoded = Instance::from_json(&text).unwrap();
        assert_eq!(decoded, instance);
        assert_eq!(decoded.to_json_pretty().unwrap(), text);
    }

    #[test]
    fn payload_is_serialized_with_kind_tag() {
        let value = serde_json::to_value(sample_instance()).unwrap();
        assert_eq!(value["payload"]["kind"], "graph");
        assert_eq!(value["payload"]["edges"][1], serde_json::json!([2, 3]));
    }

    #[test]
    fn payload_hash_ignores_provenance() {
        let a = sample_instance();
        let mut b = sample_instance();
        b.seed = 99;
        b.generator.model = "other".into();
        assert_eq!(a.payload.sha256(), b.payload.sha256());
    }

    #[test]
    fn tampered_payload_is_reported_as_corrupt() {
        let mut value = serde_json::to_value(sample_instance()).unwrap();
        value["payload"]["edges"] = serde_json::json!([[0, 1]]);
        let err = Instance::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, KernelError::CorruptInstance { .. }));
        assert!(err.to_string().contains("payload hash mismatch"));
    }

    #[test]
    fn unknown_format_version_is_rejected_before_schema_decoding() {
        let mut value = serde_json::to_value(sample_instance()).unwrap();
        value["format_version"] = serde_json::json!(2);
        value["brand_new_field"] = serde_json::json!(true);
        let err = Instance::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            KernelError::UnsupportedFormatVersion { found: 2, .. }
        ));
    }

    #[test]
    fn non_canonical_payload_is_corrupt() {
        let mut instance = sample_instance();
        instance.payload = Payload::Graph(Graph {
            vertices: 4,
            edges: vec![(2, 3), (0, 1)],
        });
        instance.payload_sha256 = instance.payload.sha256();
        let err = Instance::from_json(&instance.to_json_pretty().unwrap()).unwrap_err();
        assert!(err.to_string().contains("strictly ascending"));
    }
}
