//! Content sanitization pipeline
//!
//! Text submitted for sanitization flows classifier → scorer → watermark:
//! structural matchers redact sensitive spans, the scorer quantifies the
//! residual risk, and the codec stamps an invisible provenance marker on the
//! redacted output.

pub mod classifier;
pub mod forensic;
pub mod scorer;
pub mod watermark;

pub use classifier::{Classification, Classifier};
pub use forensic::{Disposition, ForensicExport};

use serde::{Deserialize, Serialize};

/// Closed set of sensitive-content classifications.
///
/// Wire form matches the category labels consumed by observers,
/// e.g. `IDENTITY_EXPOSURE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryTag {
    IdentityExposure,
    ContactLeak,
    FinancialRisk,
    CredentialRisk,
}

impl std::fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdentityExposure => write!(f, "IDENTITY_EXPOSURE"),
            Self::ContactLeak => write!(f, "CONTACT_LEAK"),
            Self::FinancialRisk => write!(f, "FINANCIAL_RISK"),
            Self::CredentialRisk => write!(f, "CREDENTIAL_RISK"),
        }
    }
}

/// A request to sanitize submitted text. Ephemeral, per-call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationRequest {
    pub raw_text: String,
    #[serde(default)]
    pub submitter_id: Option<String>,
    #[serde(default)]
    pub source_tag: Option<String>,
}

impl SanitizationRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            submitter_id: None,
            source_tag: None,
        }
    }

    pub fn submitter(mut self, id: impl Into<String>) -> Self {
        self.submitter_id = Some(id.into());
        self
    }

    pub fn source(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = Some(tag.into());
        self
    }
}

/// Outcome of a sanitization call. Derived, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationResult {
    /// Redacted text with the provenance marker appended (when non-empty)
    pub sanitized_text: String,
    /// Detected categories, unique, in first-triggered order
    pub detected_categories: Vec<CategoryTag>,
    /// 0-100 residual integrity score
    pub integrity_score: u8,
    /// Whether the output carries the provenance marker
    pub watermarked: bool,
    /// Whether any category was detected
    pub violation: bool,
}
