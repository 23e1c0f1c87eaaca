//! Audit record shapes
//!
//! Two record kinds share the append-only store: per-sanitization entries
//! and incident entries. The wire form is a `kind`-tagged JSON object with
//! camelCase fields.

use crate::sanitize::CategoryTag;
use crate::telemetry::Severity;
use serde::{Deserialize, Serialize};

/// Submitter recorded when a sanitization call carries no identity.
pub const DEFAULT_SUBMITTER: &str = "anonymous";

/// Fixed automated-origin submitter for incident records.
pub const INCIDENT_SUBMITTER: &str = "system-alarm";

/// Source tag recorded when a sanitization call carries none.
pub const DEFAULT_SOURCE: &str = "endpoint-agent";

/// Source tag recorded on incident records.
pub const INCIDENT_SOURCE: &str = "incident-pipeline";

/// A persisted audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    /// Millisecond epoch server timestamp
    pub created_at: i64,
    #[serde(flatten)]
    pub detail: AuditDetail,
}

/// Record payload, distinct per origin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AuditDetail {
    /// One sanitization call
    #[serde(rename_all = "camelCase")]
    Sanitization {
        submitter_id: String,
        original_length: usize,
        sanitized_length: usize,
        categories: Vec<CategoryTag>,
        source_tag: String,
        integrity_score: u8,
    },
    /// One reported incident
    #[serde(rename_all = "camelCase")]
    Incident {
        submitter_id: String,
        incident_type: String,
        subject_label: String,
        severity: Severity,
        evidence_attached: bool,
        source_tag: String,
    },
}

impl AuditDetail {
    pub fn submitter_id(&self) -> &str {
        match self {
            Self::Sanitization { submitter_id, .. } => submitter_id,
            Self::Incident { submitter_id, .. } => submitter_id,
        }
    }
}
