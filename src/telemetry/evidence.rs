//! Bounded forensic evidence buffer
//!
//! Keeps the most recent K evidence snippets attached to reported incidents.
//! Insert prepends and evicts the oldest entry in the same critical section,
//! so the size bound holds at every observable point. The evidence payload
//! is an opaque blob to this core.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A captured forensic snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEntry {
    pub id: String,
    pub incident_type: String,
    pub evidence: String,
    /// Millisecond epoch capture time
    pub captured_at: i64,
}

/// Fixed-capacity, newest-first ring buffer.
pub struct EvidenceBuffer {
    entries: Arc<RwLock<VecDeque<EvidenceEntry>>>,
    capacity: usize,
}

impl EvidenceBuffer {
    /// Create a buffer retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Capture a snippet, evicting the oldest entry beyond capacity.
    pub async fn insert(
        &self,
        incident_type: impl Into<String>,
        evidence: impl Into<String>,
    ) -> EvidenceEntry {
        let entry = EvidenceEntry {
            id: format!("sec-{}", &Uuid::new_v4().simple().to_string()[..8]),
            incident_type: incident_type.into(),
            evidence: evidence.into(),
            captured_at: chrono::Utc::now().timestamp_millis(),
        };

        let mut entries = self.entries.write().await;
        entries.push_front(entry.clone());
        while entries.len() > self.capacity {
            entries.pop_back();
        }

        entry
    }

    /// All retained entries, newest first.
    pub async fn snapshot(&self) -> Vec<EvidenceEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Drop every entry.
    pub async fn purge(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
