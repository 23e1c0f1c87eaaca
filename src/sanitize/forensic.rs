//! Forensic export wrapper for sanitization results
//!
//! Dashboards and compliance exports consume a decorated view of a
//! sanitization result: a capture-time forensic hash, an asset disposition
//! derived from the integrity score, and the signature scheme label.

use crate::sanitize::SanitizationResult;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Signature scheme label attached to every export.
pub const SIGNATURE_TYPE: &str = "zero-width-steganography";

/// Compliance posture label advertised to downstream consumers.
pub const COMPLIANCE_LEVEL: &str = "GDPR_SOC2_READY";

/// Asset disposition based on residual integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    SecureAsset,
    CompromisedPayload,
}

/// Decorated sanitization result for forensic consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicExport {
    pub integrity_score: u8,
    pub watermarked: bool,
    pub forensic_hash: String,
    pub status: Disposition,
    pub compliance_level: String,
    pub signature_type: String,
    pub captured_at: String,
}

impl ForensicExport {
    /// Build an export from a result and its RFC 3339 capture timestamp.
    pub fn from_result(result: &SanitizationResult, captured_at: &str) -> Self {
        let status = if result.integrity_score > 50 {
            Disposition::SecureAsset
        } else {
            Disposition::CompromisedPayload
        };
        Self {
            integrity_score: result.integrity_score,
            watermarked: result.watermarked,
            forensic_hash: STANDARD.encode(captured_at),
            status,
            compliance_level: COMPLIANCE_LEVEL.to_string(),
            signature_type: SIGNATURE_TYPE.to_string(),
            captured_at: captured_at.to_string(),
        }
    }
}

/// Trap payload substituted for sanitized output in distress flows.
pub fn honeypot_payload() -> &'static str {
    "ACCESS_DENIED: node under maintenance. Error 0x8823."
}
