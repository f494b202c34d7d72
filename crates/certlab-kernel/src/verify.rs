//! The certificate verifier: a pure function of (instance, certificate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::certificate::{Certificate, ClaimType};
use crate::claims::check_graph_claim;
use crate::format_timestamp;
use crate::instance::{Instance, InstanceId, Payload};

/// Input errors: the certificate could not be checked at all.
///
/// A certificate that is checked and found wrong is not an error; it yields
/// [`Verdict::Refuted`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Instance '{id}' referenced by the certificate was not found")]
    InstanceNotFound { id: String },
    #[error("Malformed certificate: {reason}")]
    MalformedCertificate { reason: String },
}

impl VerifyError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        VerifyError::MalformedCertificate {
            reason: reason.into(),
        }
    }

    pub fn not_found(id: &InstanceId) -> Self {
        VerifyError::InstanceNotFound { id: id.to_string() }
    }
}

/// Outcome of checking a well-formed certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The witness satisfies the claim.
    Holds,
    /// The witness does not satisfy the claim, with the first violation found.
    Refuted(String),
}

impl Verdict {
    pub fn holds(&self) -> bool {
        matches!(self, Verdict::Holds)
    }
}

/// Verification report for one (instance, certificate) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResult {
    pub instance_id: InstanceId,
    pub claim_type: ClaimType,
    /// `true` when the certificate is valid.
    pub verdict: bool,
    /// Why the claim does not hold; present exactly when `verdict` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// When the check ran. Metadata only; never influences the verdict.
    pub checked_at: String,
    pub instance_payload_sha256: String,
    pub certificate_sha256: String,
}

/// Decide whether `certificate`'s witness satisfies its claim on `instance`.
///
/// # Parameters
/// - `instance`: The instance the certificate must reference.
/// - `certificate`: Claim plus witness.
///
/// # Returns
/// [`Verdict::Holds`] or [`Verdict::Refuted`] for well-formed input;
/// [`VerifyError::InstanceNotFound`] when the certificate references a
/// different instance, [`VerifyError::MalformedCertificate`] when the witness
/// or bound does not fit the claim's schema.
pub fn check(instance: &Instance, certificate: &Certificate) -> Result<Verdict, VerifyError> {
    if certificate.instance_id != instance.id {
        return Err(VerifyError::not_found(&certificate.instance_id));
    }
    let verdict = match &instance.payload {
        Payload::Graph(graph) => check_graph_claim(graph, certificate)?,
    };
    debug!(
        instance = %instance.id,
        claim = %certificate.claim_type,
        holds = verdict.holds(),
        "certificate checked"
    );
    Ok(verdict)
}

/// [`check`] plus result metadata stamped with the current time.
pub fn verify(
    instance: &Instance,
    certificate: &Certificate,
) -> Result<VerificationResult, VerifyError> {
    verify_at(instance, certificate, Utc::now())
}

/// [`verify`] with an explicit `checked_at` timestamp.
pub fn verify_at(
    instance: &Instance,
    certificate: &Certificate,
    checked_at: DateTime<Utc>,
) -> Result<VerificationResult, VerifyError> {
    let verdict = check(instance, certificate)?;
    let certificate_sha256 = certificate
        .sha256()
        .map_err(|e| VerifyError::malformed(format!("certificate cannot be encoded: {e}")))?;
    let (valid, failure_reason) = match verdict {
        Verdict::Holds => (true, None),
        Verdict::Refuted(reason) => (false, Some(reason)),
    };
    info!(
        instance = %instance.id,
        claim = %certificate.claim_type,
        valid,
        "verification finished"
    );
    Ok(VerificationResult {
        instance_id: instance.id.clone(),
        claim_type: certificate.claim_type,
        verdict: valid,
        failure_reason,
        checked_at: format_timestamp(checked_at),
        instance_payload_sha256: instance.payload_sha256.clone(),
        certificate_sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::instance::GeneratorInfo;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn triangle_plus_tail() -> Instance {
        let graph = Graph::from_edges(4, [(0, 1), (1, 2), (0, 2), (2, 3)]).unwrap();
        Instance::new(
            InstanceId::parse("gnm-s3-0000").unwrap(),
            3,
            0,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            GeneratorInfo {
                tool: "certlab-gen".into(),
                version: "0.0.0".into(),
                model: "gnm".into(),
                parameters: BTreeMap::new(),
            },
            Payload::Graph(graph),
        )
    }

    fn cert(claim: ClaimType, bound: Option<u64>, witness: serde_json::Value) -> Certificate {
        Certificate::new(InstanceId::parse("gnm-s3-0000").unwrap(), claim, bound, witness)
    }

    #[test]
    fn valid_certificate_yields_true_verdict_without_reason() {
        let instance = triangle_plus_tail();
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let result = verify_at(
            &instance,
            &cert(ClaimType::Clique, Some(3), json!({"vertices": [0, 1, 2]})),
            at,
        )
        .unwrap();
        assert!(result.verdict);
        assert_eq!(result.failure_reason, None);
        assert_eq!(result.checked_at, "2024-06-01T00:00:00Z");
        assert_eq!(result.instance_payload_sha256, instance.payload_sha256);
    }

    #[test]
    fn wrong_witness_yields_false_verdict_with_reason() {
        let instance = triangle_plus_tail();
        let result = verify(
            &instance,
            &cert(ClaimType::Clique, Some(3), json!({"vertices": [1, 2, 3]})),
        )
        .unwrap();
        assert!(!result.verdict);
        let reason = result.failure_reason.expect("refuted result carries a reason");
        assert!(reason.contains("not adjacent"), "{reason}");
    }

    #[test]
    fn certificate_for_another_instance_is_instance_not_found() {
        let instance = triangle_plus_tail();
        let mut other = cert(ClaimType::HasEdge, None, json!({"edge": [0, 1]}));
        other.instance_id = InstanceId::parse("gnm-s3-0001").unwrap();
        assert_eq!(
            check(&instance, &other).unwrap_err(),
            VerifyError::InstanceNotFound {
                id: "gnm-s3-0001".into()
            }
        );
    }

    #[test]
    fn verdict_is_independent_of_check_time() {
        let instance = triangle_plus_tail();
        let certificate = cert(ClaimType::OddCycle, None, json!({"cycle": [0, 1, 2]}));
        let early = verify_at(
            &instance,
            &certificate,
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let late = verify_at(
            &instance,
            &certificate,
            Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(early.verdict, late.verdict);
        assert_eq!(early.certificate_sha256, late.certificate_sha256);
        assert_ne!(early.checked_at, late.checked_at);
    }

    #[test]
    fn results_serialize_without_reason_when_valid() {
        let instance = triangle_plus_tail();
        let result = verify(
            &instance,
            &cert(ClaimType::HasEdge, None, json!({"edge": [3, 2]})),
        )
        .unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["verdict"], json!(true));
        assert!(value.get("failure_reason").is_none());
        assert_eq!(value["claim_type"], json!("has_edge"));
    }
}
