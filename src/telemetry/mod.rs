//! Real-time security telemetry
//!
//! Incidents, drift alerts, and pass-through telemetry all fan out through
//! the [`Broadcaster`]; forensic snippets land in the bounded
//! [`EvidenceBuffer`]; the [`LivenessMonitor`] watches reporting agents for
//! heartbeat drift.

pub mod broadcaster;
pub mod evidence;
pub mod liveness;

pub use broadcaster::{Broadcaster, Envelope, Observer};
pub use evidence::{EvidenceBuffer, EvidenceEntry};
pub use liveness::{AgentStatus, LinkState, LivenessMonitor, DEFAULT_AGENT};

use serde::{Deserialize, Serialize};

/// Broadcast topic for security alerts (all observers).
pub const TOPIC_SECURITY_ALERT: &str = "security.alert";
/// Broadcast topic for opaque pass-through telemetry (all observers).
pub const TOPIC_TELEMETRY: &str = "telemetry.update";
/// Broadcast topic for session verification frames (room-addressed).
pub const TOPIC_SESSION_VERIFIED: &str = "session.verified";

/// Incident and alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Alert payload pushed to subscribers on the `security.alert` topic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// RFC 3339 emission time
    pub timestamp: String,
}

impl SecurityAlert {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            evidence: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}
