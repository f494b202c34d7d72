#![doc = include_str!("../README.md")]

//! Minimal trusted kernel for certlab instances and certificates.
//!
//! This crate owns the on-disk record shapes, their canonical digests and the
//! certificate checker. It is kept free of I/O so that it can be audited
//! independently of the generator and the store.

pub mod certificate;
pub mod claims;
pub mod graph;
pub mod instance;
pub mod verify;

pub use certificate::{Certificate, CertificateMetadata, ClaimType, CERTIFICATE_FORMAT_VERSION};
pub use graph::Graph;
pub use instance::{GeneratorInfo, Instance, InstanceId, Payload, INSTANCE_FORMAT_VERSION};
pub use verify::{check, verify, verify_at, Verdict, VerificationResult, VerifyError};

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors raised while decoding or validating stored records.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported {record} format version {found} (expected exactly {expected})")]
    UnsupportedFormatVersion {
        record: &'static str,
        found: u64,
        expected: u32,
    },
    #[error("Invalid instance id '{0}': ids use [A-Za-z0-9._-] and must not start with '.'")]
    InvalidId(String),
    #[error("Corrupt instance '{id}': {reason}")]
    CorruptInstance { id: String, reason: String },
}

/// Compute a lowercase hexadecimal SHA-256 digest for raw bytes.
///
/// # Parameters
/// - `bytes`: Input payload.
///
/// # Returns
/// 64-character lowercase hex digest.
pub fn sha256_hex_bytes(bytes: &[u8]) -> String {
    hex_digest(Sha256::digest(bytes).as_slice())
}

pub(crate) fn hex_digest(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Render a UTC timestamp the way every certlab record stores it
/// (RFC 3339, whole seconds, `Z` suffix).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Read the `format_version` field of a raw record without committing to a
/// schema, so that records from a newer format are rejected instead of being
/// misread.
pub(crate) fn peek_format_version(value: &serde_json::Value) -> Option<u64> {
    value.get("format_version").and_then(serde_json::Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sha256_of_empty_input_matches_known_vector() {
        assert_eq!(
            sha256_hex_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn timestamps_render_with_whole_seconds_and_z_suffix() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 9).unwrap();
        assert_eq!(format_timestamp(at), "2024-02-29T13:05:09Z");
        assert_eq!(parse_timestamp("2024-02-29T13:05:09Z"), Some(at));
    }

    #[test]
    fn parse_timestamp_normalizes_offsets_to_utc() {
        let parsed = parse_timestamp("2024-03-01T01:00:00+02:00").expect("valid rfc3339");
        assert_eq!(format_timestamp(parsed), "2024-02-29T23:00:00Z");
        assert!(parse_timestamp("yesterday").is_none());
    }
}
