//! Single-use session link handshake
//!
//! A requester obtains a session id and waits in the broadcaster room named
//! by that id; a verifier later submits verification for the id. On a match
//! the link is consumed: the verified frame goes out to the room and the
//! record is deleted. Verifying an unknown or already-consumed id is a
//! silent no-op.
//!
//! Pending links do not expire server-side by default — the countdown
//! advertised to clients is cosmetic. Setting `pending_ttl_secs` enables a
//! background sweep that bounds the pending set.

use crate::config::SessionConfig;
use crate::telemetry::{Broadcaster, TOPIC_SESSION_VERIFIED};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Handshake state of a stored link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkStatus {
    Pending,
    Verified,
}

/// Ticket returned to a link requester
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTicket {
    pub session_id: String,
    /// Advisory countdown for the requesting client
    pub expires_in_secs: u64,
}

/// Frame published into the session room on verification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedNotice {
    pub session_id: String,
    pub status: String,
    pub verifier: String,
    /// RFC 3339 verification time
    pub timestamp: String,
}

struct SessionLink {
    requested_at_ms: i64,
    status: LinkStatus,
}

/// Owns the pending-link table and drives the handshake.
pub struct SessionLinkManager {
    links: Arc<RwLock<HashMap<String, SessionLink>>>,
    broadcaster: Arc<Broadcaster>,
    config: SessionConfig,
}

impl SessionLinkManager {
    pub fn new(broadcaster: Arc<Broadcaster>, config: SessionConfig) -> Self {
        Self {
            links: Arc::new(RwLock::new(HashMap::new())),
            broadcaster,
            config,
        }
    }

    /// Create a pending link and return its ticket.
    pub async fn request(&self) -> LinkTicket {
        let session_id = format!(
            "lnk-{}",
            Uuid::new_v4().simple().to_string()[..12].to_uppercase()
        );

        self.links.write().await.insert(
            session_id.clone(),
            SessionLink {
                requested_at_ms: chrono::Utc::now().timestamp_millis(),
                status: LinkStatus::Pending,
            },
        );

        tracing::info!(session_id = %session_id, "session link requested");
        LinkTicket {
            session_id,
            expires_in_secs: self.config.advertised_ttl_secs,
        }
    }

    /// Verify a pending link, notifying its room and consuming the record.
    ///
    /// Returns `true` when a pending link was consumed; a missing or
    /// already-consumed id returns `false` without error.
    pub async fn verify(&self, session_id: &str, verifier: &str) -> bool {
        // PENDING -> VERIFIED is terminal: the record is consumed in the
        // same critical section that observes it.
        let consumed = self.links.write().await.remove(session_id).is_some();

        if !consumed {
            tracing::debug!(session_id, "verification for unknown or consumed link ignored");
            return false;
        }

        let notice = VerifiedNotice {
            session_id: session_id.to_string(),
            status: "ACCESS_GRANTED".to_string(),
            verifier: verifier.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.broadcaster
            .publish(
                TOPIC_SESSION_VERIFIED,
                serde_json::to_value(&notice).unwrap_or_default(),
                Some(session_id),
            )
            .await;

        tracing::info!(session_id, verifier, "session link verified");
        true
    }

    /// Drop pending links older than the TTL as of `now_ms`.
    /// Returns how many were swept.
    pub async fn sweep_expired(&self, now_ms: i64) -> usize {
        if self.config.pending_ttl_secs == 0 {
            return 0;
        }
        let ttl_ms = (self.config.pending_ttl_secs * 1_000) as i64;

        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|_, link| now_ms - link.requested_at_ms <= ttl_ms);
        let swept = before - links.len();
        if swept > 0 {
            tracing::info!(swept, "expired pending session links dropped");
        }
        swept
    }

    /// Spawn the TTL sweep loop when expiry is enabled.
    pub fn spawn_sweep(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if self.config.pending_ttl_secs == 0 {
            tracing::debug!("session link expiry disabled, skipping sweep");
            return None;
        }

        let manager = self.clone();
        let interval_secs = self.config.sweep_interval_secs.max(1);
        Some(tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager
                    .sweep_expired(chrono::Utc::now().timestamp_millis())
                    .await;
            }
        }))
    }

    /// Number of links still pending.
    pub async fn pending_count(&self) -> usize {
        self.links
            .read()
            .await
            .values()
            .filter(|link| link.status == LinkStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TOPIC_SESSION_VERIFIED;

    fn manager_with(config: SessionConfig) -> (Arc<SessionLinkManager>, Arc<Broadcaster>) {
        let bus = Arc::new(Broadcaster::new());
        let manager = Arc::new(SessionLinkManager::new(bus.clone(), config));
        (manager, bus)
    }

    fn manager() -> (Arc<SessionLinkManager>, Arc<Broadcaster>) {
        manager_with(SessionConfig::default())
    }

    #[tokio::test]
    async fn test_request_creates_pending_link() {
        let (manager, _bus) = manager();
        let ticket = manager.request().await;
        assert!(ticket.session_id.starts_with("lnk-"));
        assert_eq!(ticket.expires_in_secs, 300);
        assert_eq!(manager.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_verify_delivers_only_to_session_room() {
        let (manager, bus) = manager();
        let ticket = manager.request().await;

        let mut joined = bus.subscribe().await;
        bus.join(&ticket.session_id, joined.id()).await;
        let mut bystander = bus.subscribe().await;

        assert!(manager.verify(&ticket.session_id, "userX").await);

        let frame = joined.recv().await.unwrap();
        assert_eq!(frame.topic, TOPIC_SESSION_VERIFIED);
        assert_eq!(frame.payload["verifier"], "userX");
        assert_eq!(frame.payload["status"], "ACCESS_GRANTED");
        assert!(bystander.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_verify_consumes_link() {
        let (manager, _bus) = manager();
        let ticket = manager.request().await;

        assert!(manager.verify(&ticket.session_id, "userX").await);
        assert_eq!(manager.pending_count().await, 0);

        // Second verification of the consumed id is a silent no-op
        assert!(!manager.verify(&ticket.session_id, "userX").await);
    }

    #[tokio::test]
    async fn test_verify_unknown_id_is_noop() {
        let (manager, _bus) = manager();
        assert!(!manager.verify("lnk-DOESNOTEXIST", "userX").await);
    }

    #[tokio::test]
    async fn test_sweep_disabled_by_default() {
        let (manager, _bus) = manager();
        manager.request().await;
        let swept = manager.sweep_expired(i64::MAX).await;
        assert_eq!(swept, 0);
        assert_eq!(manager.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_only_stale_links() {
        let config = SessionConfig {
            advertised_ttl_secs: 300,
            pending_ttl_secs: 60,
            sweep_interval_secs: 60,
        };
        let (manager, _bus) = manager_with(config);

        let stale = manager.request().await;
        let now_ms = chrono::Utc::now().timestamp_millis();

        // Pretend 61s pass, then a fresh request arrives
        {
            let mut links = manager.links.write().await;
            if let Some(link) = links.get_mut(&stale.session_id) {
                link.requested_at_ms = now_ms - 61_000;
            }
        }
        let fresh = manager.request().await;

        let swept = manager.sweep_expired(now_ms).await;
        assert_eq!(swept, 1);
        assert_eq!(manager.pending_count().await, 1);

        // The stale link is gone, the fresh one verifies
        assert!(!manager.verify(&stale.session_id, "u").await);
        assert!(manager.verify(&fresh.session_id, "u").await);
    }
}
