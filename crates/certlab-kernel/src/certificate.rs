//! Certificate records: a claim about one instance plus the evidence for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::instance::InstanceId;
use crate::verify::VerifyError;
use crate::{hex_digest, peek_format_version, KernelError};

/// Current certificate record format version.
pub const CERTIFICATE_FORMAT_VERSION: u32 = 1;

const CERTIFICATE_HASH_DOMAIN_TAG: &str = "certlab-certificate-v1\n";

/// The fixed set of claims a certificate can make about a graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// The graph has at least one edge.
    HasEdge,
    /// The graph has an independent set of size at least `bound`.
    IndependentSet,
    /// The graph has a clique of size at least `bound`.
    Clique,
    /// The graph has a vertex cover of size at most `bound`.
    VertexCover,
    /// The graph is properly colorable with `bound` colors.
    ProperColoring,
    /// The graph is connected.
    Connected,
    /// The graph contains an odd cycle (so it is not bipartite).
    OddCycle,
    /// The graph has a Hamiltonian cycle.
    HamiltonianCycle,
}

impl ClaimType {
    pub const ALL: [ClaimType; 8] = [
        ClaimType::HasEdge,
        ClaimType::IndependentSet,
        ClaimType::Clique,
        ClaimType::VertexCover,
        ClaimType::ProperColoring,
        ClaimType::Connected,
        ClaimType::OddCycle,
        ClaimType::HamiltonianCycle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::HasEdge => "has_edge",
            ClaimType::IndependentSet => "independent_set",
            ClaimType::Clique => "clique",
            ClaimType::VertexCover => "vertex_cover",
            ClaimType::ProperColoring => "proper_coloring",
            ClaimType::Connected => "connected",
            ClaimType::OddCycle => "odd_cycle",
            ClaimType::HamiltonianCycle => "hamiltonian_cycle",
        }
    }

    /// Whether the claim is parameterized by an integer `bound`.
    pub fn takes_bound(self) -> bool {
        matches!(
            self,
            ClaimType::IndependentSet
                | ClaimType::Clique
                | ClaimType::VertexCover
                | ClaimType::ProperColoring
        )
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimType::ALL
            .into_iter()
            .find(|claim| claim.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ClaimType::ALL.iter().map(|c| c.as_str()).collect();
                format!(
                    "unknown claim type '{}' (expected one of {})",
                    s,
                    known.join(", ")
                )
            })
    }
}

/// Optional producer information attached to a certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CertificateMetadata {
    /// Who or what produced the witness (solver name, script, person).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    /// When the witness was produced (free-form, RFC 3339 recommended).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A claim about one instance together with its witness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Certificate {
    /// Record format version.
    pub format_version: u32,
    /// The instance the claim is about.
    pub instance_id: InstanceId,
    /// Which claim is made.
    pub claim_type: ClaimType,
    /// Integer parameter for bounded claims.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<u64>,
    /// Claim-specific evidence; its schema depends on `claim_type`.
    pub witness: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CertificateMetadata>,
}

impl Certificate {
    pub fn new(
        instance_id: InstanceId,
        claim_type: ClaimType,
        bound: Option<u64>,
        witness: serde_json::Value,
    ) -> Self {
        Self {
            format_version: CERTIFICATE_FORMAT_VERSION,
            instance_id,
            claim_type,
            bound,
            witness,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: CertificateMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Decode one certificate record.
    ///
    /// Every decoding problem is a [`VerifyError::MalformedCertificate`]: the
    /// certificate cannot be checked at all, which is different from a
    /// certificate that is checked and found wrong.
    pub fn from_json(text: &str) -> Result<Self, VerifyError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| VerifyError::malformed(format!("invalid certificate JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, VerifyError> {
        match peek_format_version(&value) {
            Some(found) if found == u64::from(CERTIFICATE_FORMAT_VERSION) => {}
            Some(found) => {
                return Err(VerifyError::malformed(format!(
                    "unsupported certificate format version {found} (expected exactly {CERTIFICATE_FORMAT_VERSION})"
                )))
            }
            None => {
                return Err(VerifyError::malformed(
                    "certificate is missing an integer format_version",
                ))
            }
        }
        serde_json::from_value(value)
            .map_err(|e| VerifyError::malformed(format!("certificate does not match schema: {e}")))
    }

    /// Decode a JSON Lines batch, one certificate per non-blank line.
    pub fn from_jsonl(text: &str) -> Result<Vec<Self>, VerifyError> {
        let mut certificates = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let certificate = Self::from_json(line).map_err(|err| match err {
                VerifyError::MalformedCertificate { reason } => {
                    VerifyError::malformed(format!("line {}: {}", line_no + 1, reason))
                }
                other => other,
            })?;
            certificates.push(certificate);
        }
        Ok(certificates)
    }

    pub fn to_json_pretty(&self) -> Result<String, KernelError> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Digest of the canonical compact encoding, pinning exactly what was checked.
    pub fn sha256(&self) -> Result<String, KernelError> {
        let body = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(CERTIFICATE_HASH_DOMAIN_TAG.as_bytes());
        hasher.update(&body);
        Ok(hex_digest(hasher.finalize().as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> InstanceId {
        InstanceId::parse("gnp-s1-0000").unwrap()
    }

    #[test]
    fn claim_types_round_trip_through_strings() {
        for claim in ClaimType::ALL {
            assert_eq!(claim.as_str().parse::<ClaimType>().unwrap(), claim);
            let encoded = serde_json::to_value(claim).unwrap();
            assert_eq!(encoded, json!(claim.as_str()));
        }
        assert!("triangle".parse::<ClaimType>().unwrap_err().contains("has_edge"));
    }

    #[test]
    fn decode_accepts_minimal_certificate() {
        let cert = Certificate::from_json(
            r#"{"format_version":1,"instance_id":"gnp-s1-0000","claim_type":"has_edge","witness":{"edge":[0,1]}}"#,
        )
        .unwrap();
        assert_eq!(cert.claim_type, ClaimType::HasEdge);
        assert_eq!(cert.bound, None);
        assert!(cert.metadata.is_none());
    }

    #[test]
    fn decode_failures_are_malformed_certificates() {
        let cases = [
            "not json",
            r#"{"instance_id":"gnp-s1-0000","claim_type":"has_edge","witness":{}}"#,
            r#"{"format_version":9,"instance_id":"gnp-s1-0000","claim_type":"has_edge","witness":{}}"#,
            r#"{"format_version":1,"instance_id":"gnp-s1-0000","claim_type":"triangle","witness":{}}"#,
            r#"{"format_version":1,"instance_id":"../x","claim_type":"has_edge","witness":{}}"#,
            r#"{"format_version":1,"instance_id":"gnp-s1-0000","claim_type":"has_edge","witness":{},"extra":1}"#,
        ];
        for case in cases {
            let err = Certificate::from_json(case).unwrap_err();
            assert!(
                matches!(err, VerifyError::MalformedCertificate { .. }),
                "{case} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn jsonl_reports_line_numbers() {
        let good = Certificate::new(id(), ClaimType::HasEdge, None, json!({"edge": [0, 1]}));
        let line = serde_json::to_string(&good).unwrap();
        let text = format!("{line}\n\n{line}\n{{broken\n");
        let err = Certificate::from_jsonl(&text).unwrap_err();
        assert!(err.to_string().contains("line 4"), "{err}");

        let ok = Certificate::from_jsonl(&format!("{line}\n\n{line}\n")).unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn certificate_hash_tracks_witness_and_metadata() {
        let base = Certificate::new(id(), ClaimType::Clique, Some(3), json!({"vertices": [0, 1, 2]}));
        let other_witness =
            Certificate::new(id(), ClaimType::Clique, Some(3), json!({"vertices": [0, 1, 3]}));
        let annotated = base.clone().with_metadata(CertificateMetadata {
            producer: Some("greedy".into()),
            ..CertificateMetadata::default()
        });
        let digest = |cert: &Certificate| cert.sha256().unwrap();
        assert_eq!(digest(&base), digest(&base.clone()));
        assert_ne!(digest(&base), digest(&other_witness));
        assert_ne!(digest(&base), digest(&annotated));
    }

    #[test]
    fn pretty_encoding_decodes_back_and_ends_with_newline() {
        let cert = Certificate::new(id(), ClaimType::Connected, None, json!({"spanning_tree": []}))
            .with_metadata(CertificateMetadata {
                notes: Some("empty tree".into()),
                ..CertificateMetadata::default()
            });
        let text = cert.to_json_pretty().unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(Certificate::from_json(&text).unwrap(), cert);
    }
}
