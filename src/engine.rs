//! Security engine — the facade over the sanitization and telemetry core
//!
//! Owns every stateful component (audit recorder, evidence buffer,
//! broadcaster, liveness monitor, session links) as explicit constructed
//! state; nothing lives in module-level globals. Inbound operations map
//! one-to-one onto the external surface: submit, report_incident,
//! heartbeat, request/verify session link, admin purge.

use crate::audit::{
    AuditDetail, AuditRecord, AuditRecorder, DEFAULT_SOURCE, DEFAULT_SUBMITTER, INCIDENT_SOURCE,
    INCIDENT_SUBMITTER,
};
use crate::config::ShieldGateConfig;
use crate::error::{Error, Result};
use crate::sanitize::{scorer, watermark, Classifier, SanitizationRequest, SanitizationResult};
use crate::session::{LinkTicket, SessionLinkManager};
use crate::telemetry::{
    Broadcaster, EvidenceBuffer, LivenessMonitor, Observer, SecurityAlert, Severity,
    DEFAULT_AGENT, TOPIC_SECURITY_ALERT, TOPIC_TELEMETRY,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// An incident raised by any component, decoupled from sanitization calls.
#[derive(Debug, Clone)]
pub struct IncidentReport {
    pub incident_type: String,
    pub subject_label: String,
    pub severity: Severity,
    pub evidence: Option<String>,
    /// Millisecond epoch report time
    pub occurred_at: i64,
}

impl IncidentReport {
    pub fn new(
        incident_type: impl Into<String>,
        subject_label: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            incident_type: incident_type.into(),
            subject_label: subject_label.into(),
            severity,
            evidence: None,
            occurred_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

/// Coarse threat posture derived from forensic pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatIndex {
    Low,
    Elevated,
}

/// Point-in-time operational snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub uptime_secs: u64,
    pub observers: usize,
    pub tracked_agents: usize,
    pub audit_records: usize,
    pub evidence_entries: usize,
    pub pending_links: usize,
    pub threat_index: ThreatIndex,
}

/// The sanitization, audit, and telemetry core.
pub struct SecurityEngine {
    classifier: Classifier,
    recorder: AuditRecorder,
    evidence: Arc<EvidenceBuffer>,
    broadcaster: Arc<Broadcaster>,
    liveness: Arc<LivenessMonitor>,
    links: Arc<SessionLinkManager>,
    config: ShieldGateConfig,
    started_at: std::time::Instant,
}

impl SecurityEngine {
    /// Construct the engine and its owned components.
    pub async fn new(config: ShieldGateConfig) -> Result<Self> {
        let classifier = Classifier::new()?;
        let recorder = AuditRecorder::new(&config.audit).await?;
        let broadcaster = Arc::new(Broadcaster::new());
        let evidence = Arc::new(EvidenceBuffer::new(config.evidence.capacity));
        let liveness = Arc::new(LivenessMonitor::new(
            broadcaster.clone(),
            config.liveness.clone(),
        ));
        let links = Arc::new(SessionLinkManager::new(
            broadcaster.clone(),
            config.session.clone(),
        ));

        Ok(Self {
            classifier,
            recorder,
            evidence,
            broadcaster,
            liveness,
            links,
            config,
            started_at: std::time::Instant::now(),
        })
    }

    /// Spawn the background loops: liveness drift checks and, when enabled,
    /// the pending-link sweep.
    pub fn start(&self) {
        let _ = self.liveness.spawn();
        let _ = self.links.spawn_sweep();
        tracing::info!(
            check_interval_secs = self.config.liveness.check_interval_secs,
            drift_threshold_secs = self.config.liveness.drift_threshold_secs,
            "security engine started"
        );
    }

    // =========================================================================
    // Sanitization pipeline
    // =========================================================================

    /// Sanitize submitted text: classify → score → watermark → audit.
    ///
    /// Always returns a well-formed result; empty input yields the defined
    /// empty result. The audit write is best-effort and cannot fail the call.
    pub async fn submit(&self, request: SanitizationRequest) -> SanitizationResult {
        let classification = self.classifier.classify(&request.raw_text);
        let integrity_score = scorer::integrity_score(&classification.categories);
        let violation = scorer::is_violation(&classification.categories);

        let watermarked = !classification.sanitized_text.is_empty();
        let sanitized_text = watermark::embed(&classification.sanitized_text);

        let result = SanitizationResult {
            sanitized_text,
            detected_categories: classification.categories,
            integrity_score,
            watermarked,
            violation,
        };

        if violation {
            tracing::warn!(
                categories = ?result.detected_categories,
                integrity_score,
                "sensitive content redacted"
            );
        }

        let detail = AuditDetail::Sanitization {
            submitter_id: request
                .submitter_id
                .unwrap_or_else(|| DEFAULT_SUBMITTER.to_string()),
            original_length: request.raw_text.chars().count(),
            sanitized_length: result.sanitized_text.chars().count(),
            categories: result.detected_categories.clone(),
            source_tag: request
                .source_tag
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            integrity_score,
        };
        self.recorder.append(detail).await;

        result
    }

    // =========================================================================
    // Incidents & telemetry
    // =========================================================================

    /// Record an incident: evidence capture, alert fan-out, audit append.
    pub async fn report_incident(&self, report: IncidentReport) -> Result<()> {
        if report.incident_type.trim().is_empty() {
            return Err(Error::InvalidInput("incident type is required".to_string()));
        }
        if report.subject_label.trim().is_empty() {
            return Err(Error::InvalidInput(
                "incident subject label is required".to_string(),
            ));
        }

        if let Some(evidence) = &report.evidence {
            self.evidence
                .insert(&report.incident_type, evidence.clone())
                .await;
        }

        let mut alert = SecurityAlert::new(
            format!("{}: {}", report.incident_type, report.subject_label),
            report.severity,
        );
        if let Some(evidence) = &report.evidence {
            alert = alert.with_evidence(evidence.clone());
        }
        self.broadcaster
            .publish(
                TOPIC_SECURITY_ALERT,
                serde_json::to_value(&alert).unwrap_or_default(),
                None,
            )
            .await;

        let detail = AuditDetail::Incident {
            submitter_id: INCIDENT_SUBMITTER.to_string(),
            incident_type: report.incident_type,
            subject_label: report.subject_label,
            severity: report.severity,
            evidence_attached: report.evidence.is_some(),
            source_tag: INCIDENT_SOURCE.to_string(),
        };
        self.recorder.append(detail).await;

        Ok(())
    }

    /// Record a reporting agent's heartbeat and re-broadcast its opaque
    /// status payload to observers.
    pub async fn heartbeat(&self, agent_id: Option<&str>, status: serde_json::Value) {
        let agent = agent_id.unwrap_or(DEFAULT_AGENT);
        self.liveness.heartbeat(agent).await;
        self.broadcaster
            .publish(TOPIC_TELEMETRY, status, None)
            .await;
    }

    // =========================================================================
    // Session links
    // =========================================================================

    /// Create a pending session link.
    pub async fn request_session_link(&self) -> LinkTicket {
        self.links.request().await
    }

    /// Verify a pending session link.
    ///
    /// A missing or already-consumed id is a silent no-op; only malformed
    /// input is an error.
    pub async fn verify_session_link(&self, session_id: &str, verifier: &str) -> Result<()> {
        if session_id.trim().is_empty() {
            return Err(Error::InvalidInput("session id is required".to_string()));
        }
        if verifier.trim().is_empty() {
            return Err(Error::InvalidInput(
                "verifier identity is required".to_string(),
            ));
        }
        self.links.verify(session_id, verifier).await;
        Ok(())
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a live observer for broadcast frames.
    pub async fn subscribe(&self) -> Observer {
        self.broadcaster.subscribe().await
    }

    /// Join an observer to a named room (e.g. a session link id).
    pub async fn join_room(&self, room: &str, observer_id: Uuid) {
        self.broadcaster.join(room, observer_id).await;
    }

    /// Remove an observer from a named room.
    pub async fn leave_room(&self, room: &str, observer_id: Uuid) {
        self.broadcaster.leave(room, observer_id).await;
    }

    // =========================================================================
    // Audit & administration
    // =========================================================================

    /// Most recent audit records, newest first.
    pub async fn query_audit(&self, limit: Option<usize>) -> Vec<AuditRecord> {
        let limit = limit.unwrap_or(self.config.audit.default_query_limit);
        self.recorder.query(limit).await
    }

    /// Irreversibly purge the audit store and the evidence buffer.
    ///
    /// Authorization is enforced by an external gate, not here.
    pub async fn admin_purge(&self) -> Result<()> {
        let purged = self.recorder.purge().await?;
        self.evidence.purge().await;
        tracing::info!(purged, "audit records and forensic buffers purged");
        Ok(())
    }

    /// Operational snapshot for status surfaces.
    pub async fn stats(&self) -> SystemStats {
        let evidence_entries = self.evidence.len().await;
        SystemStats {
            uptime_secs: self.started_at.elapsed().as_secs(),
            observers: self.broadcaster.observer_count().await,
            tracked_agents: self.liveness.agent_count().await,
            audit_records: self.recorder.len().await,
            evidence_entries,
            pending_links: self.links.pending_count().await,
            threat_index: if evidence_entries > 0 {
                ThreatIndex::Elevated
            } else {
                ThreatIndex::Low
            },
        }
    }

    /// The forensic evidence buffer.
    pub fn evidence(&self) -> &EvidenceBuffer {
        &self.evidence
    }

    /// The liveness monitor.
    pub fn liveness(&self) -> &Arc<LivenessMonitor> {
        &self.liveness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::CategoryTag;
    use tempfile::TempDir;

    async fn engine() -> (SecurityEngine, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = ShieldGateConfig::default();
        config.audit.base_dir = dir.path().to_path_buf();
        let engine = SecurityEngine::new(config).await.unwrap();
        (engine, dir)
    }

    #[tokio::test]
    async fn test_scenario_email_and_phone() {
        let (engine, _dir) = engine().await;
        let result = engine
            .submit(SanitizationRequest::new(
                "Contact me at a@b.com or 555-123-4567",
            ))
            .await;

        assert_eq!(
            result.detected_categories,
            vec![CategoryTag::IdentityExposure, CategoryTag::ContactLeak]
        );
        assert_eq!(result.integrity_score, 50);
        assert!(result.violation);
        assert!(result.sanitized_text.contains("[PROTECTED_IDENTITY]"));
        assert!(result.sanitized_text.contains("[PROTECTED_CONTACT]"));
        assert!(!result.sanitized_text.contains("a@b.com"));
        assert!(!result.sanitized_text.contains("555-123-4567"));
        assert!(result.watermarked);
        assert!(watermark::detect(&result.sanitized_text));
    }

    #[tokio::test]
    async fn test_scenario_empty_input() {
        let (engine, _dir) = engine().await;
        let result = engine.submit(SanitizationRequest::new("")).await;

        assert_eq!(result.sanitized_text, "");
        assert!(result.detected_categories.is_empty());
        assert_eq!(result.integrity_score, 100);
        assert!(!result.watermarked);
        assert!(!result.violation);
    }

    #[tokio::test]
    async fn test_scenario_credential() {
        let (engine, _dir) = engine().await;
        let result = engine
            .submit(SanitizationRequest::new("password: hunter2"))
            .await;

        assert_eq!(result.detected_categories, vec![CategoryTag::CredentialRisk]);
        assert_eq!(result.integrity_score, 75);
    }

    #[tokio::test]
    async fn test_submit_appends_audit_record() {
        let (engine, _dir) = engine().await;
        engine
            .submit(
                SanitizationRequest::new("call 555-123-4567")
                    .submitter("emp-7")
                    .source("proxy"),
            )
            .await;

        let records = engine.query_audit(Some(5)).await;
        assert_eq!(records.len(), 1);
        match &records[0].detail {
            AuditDetail::Sanitization {
                submitter_id,
                source_tag,
                categories,
                integrity_score,
                original_length,
                sanitized_length,
                ..
            } => {
                assert_eq!(submitter_id, "emp-7");
                assert_eq!(source_tag, "proxy");
                assert_eq!(categories, &vec![CategoryTag::ContactLeak]);
                assert_eq!(*integrity_score, 75);
                assert_eq!(*original_length, 17);
                // Redacted text plus the three marker code points
                assert_eq!(*sanitized_length, "call [PROTECTED_CONTACT]".chars().count() + 3);
            }
            other => panic!("unexpected audit detail: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_defaults_sentinels() {
        let (engine, _dir) = engine().await;
        engine.submit(SanitizationRequest::new("hello")).await;

        let records = engine.query_audit(None).await;
        match &records[0].detail {
            AuditDetail::Sanitization {
                submitter_id,
                source_tag,
                ..
            } => {
                assert_eq!(submitter_id, DEFAULT_SUBMITTER);
                assert_eq!(source_tag, DEFAULT_SOURCE);
            }
            other => panic!("unexpected audit detail: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scenario_incident_with_evidence() {
        let (engine, _dir) = engine().await;
        let mut obs = engine.subscribe().await;

        engine
            .report_incident(
                IncidentReport::new("visual-threat", "smartphone near screen", Severity::Critical)
                    .with_evidence("frame-bytes"),
            )
            .await
            .unwrap();

        // Ring buffer front holds the evidence
        let snapshot = engine.evidence().snapshot().await;
        assert_eq!(snapshot[0].evidence, "frame-bytes");
        assert_eq!(snapshot[0].incident_type, "visual-threat");

        // Subscriber receives the CRITICAL alert
        let frame = obs.recv().await.unwrap();
        assert_eq!(frame.topic, TOPIC_SECURITY_ALERT);
        assert_eq!(frame.payload["severity"], "CRITICAL");
        assert_eq!(frame.payload["evidence"], "frame-bytes");
        assert!(frame.payload["message"]
            .as_str()
            .unwrap()
            .contains("visual-threat"));

        // Incident audit record with the automated-origin sentinel
        let records = engine.query_audit(Some(1)).await;
        match &records[0].detail {
            AuditDetail::Incident {
                submitter_id,
                evidence_attached,
                ..
            } => {
                assert_eq!(submitter_id, INCIDENT_SUBMITTER);
                assert!(evidence_attached);
            }
            other => panic!("unexpected audit detail: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incident_without_evidence_skips_buffer() {
        let (engine, _dir) = engine().await;
        engine
            .report_incident(IncidentReport::new("probe", "port scan", Severity::Low))
            .await
            .unwrap();
        assert!(engine.evidence().is_empty().await);
    }

    #[tokio::test]
    async fn test_incident_missing_fields_rejected() {
        let (engine, _dir) = engine().await;
        let err = engine
            .report_incident(IncidentReport::new("", "subject", Severity::High))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = engine
            .report_incident(IncidentReport::new("type", "  ", Severity::High))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_heartbeat_rebroadcasts_status() {
        let (engine, _dir) = engine().await;
        let mut obs = engine.subscribe().await;

        engine
            .heartbeat(Some("guard-1"), serde_json::json!({"status": "ACTIVE"}))
            .await;

        let frame = obs.recv().await.unwrap();
        assert_eq!(frame.topic, TOPIC_TELEMETRY);
        assert_eq!(frame.payload["status"], "ACTIVE");
        assert_eq!(engine.liveness().agent_count().await, 2);
    }

    #[tokio::test]
    async fn test_scenario_session_link_handshake() {
        let (engine, _dir) = engine().await;
        let ticket = engine.request_session_link().await;

        let mut joined = engine.subscribe().await;
        engine.join_room(&ticket.session_id, joined.id()).await;
        let mut bystander = engine.subscribe().await;

        engine
            .verify_session_link(&ticket.session_id, "userX")
            .await
            .unwrap();

        let frame = joined.recv().await.unwrap();
        assert_eq!(frame.payload["verifier"], "userX");
        assert_eq!(frame.room.as_deref(), Some(ticket.session_id.as_str()));
        assert!(bystander.try_recv().is_none());

        // Re-verifying the consumed link is a silent no-op
        engine
            .verify_session_link(&ticket.session_id, "userX")
            .await
            .unwrap();
        assert!(joined.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_verify_session_link_rejects_blank_fields() {
        let (engine, _dir) = engine().await;
        assert!(engine.verify_session_link("", "userX").await.is_err());
        assert!(engine.verify_session_link("lnk-X", "").await.is_err());
    }

    #[tokio::test]
    async fn test_admin_purge_clears_audit_and_evidence() {
        let (engine, _dir) = engine().await;
        engine.submit(SanitizationRequest::new("a@b.com")).await;
        engine
            .report_incident(
                IncidentReport::new("leak", "paste", Severity::High).with_evidence("blob"),
            )
            .await
            .unwrap();

        engine.admin_purge().await.unwrap();

        assert!(engine.query_audit(Some(10)).await.is_empty());
        assert!(engine.evidence().is_empty().await);
    }

    #[tokio::test]
    async fn test_stats_threat_index_transitions() {
        let (engine, _dir) = engine().await;
        let stats = engine.stats().await;
        assert_eq!(stats.threat_index, ThreatIndex::Low);
        assert_eq!(stats.evidence_entries, 0);

        engine
            .report_incident(
                IncidentReport::new("leak", "paste", Severity::High).with_evidence("blob"),
            )
            .await
            .unwrap();

        let stats = engine.stats().await;
        assert_eq!(stats.threat_index, ThreatIndex::Elevated);
        assert_eq!(stats.audit_records, 1);
    }
}
