//! Append-only audit recorder with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base_dir>/
//! ├── aud-<token>.json
//! └── ...
//! ```
//!
//! The in-memory list is authoritative for queries; each append also writes
//! one JSON file under a bounded timeout. A failed or timed-out write is
//! logged and otherwise ignored: audit durability is best-effort, never
//! transactional with the caller's response.

use crate::audit::types::{AuditDetail, AuditRecord};
use crate::config::AuditConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only audit store.
pub struct AuditRecorder {
    base_dir: PathBuf,
    write_timeout: Duration,
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl AuditRecorder {
    /// Create a recorder at the configured directory, loading surviving
    /// records from disk.
    pub async fn new(config: &AuditConfig) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&config.base_dir).await?;

        let mut records = Self::load_records(&config.base_dir);
        records.sort_by_key(|r| r.created_at);

        Ok(Self {
            base_dir: config.base_dir.clone(),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Append a record; returns its server-generated id.
    ///
    /// The file write is bounded by the configured timeout and its failure
    /// is non-fatal — the record remains queryable in memory either way.
    pub async fn append(&self, detail: AuditDetail) -> String {
        let record = AuditRecord {
            id: format!("aud-{}", Uuid::new_v4().simple()),
            created_at: chrono::Utc::now().timestamp_millis(),
            detail,
        };
        let id = record.id.clone();

        {
            let mut records = self.records.write().await;
            records.push(record.clone());
        }

        self.persist(&record).await;
        id
    }

    /// Most recent records, newest first, up to `limit`.
    pub async fn query(&self, limit: usize) -> Vec<AuditRecord> {
        let records = self.records.read().await;
        records.iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Irreversibly drop every record, in memory and on disk.
    pub async fn purge(&self) -> std::io::Result<usize> {
        let purged = {
            let mut records = self.records.write().await;
            let n = records.len();
            records.clear();
            n
        };

        let mut dir = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Failed to remove audit file {}: {}", path.display(), e);
                }
            }
        }

        tracing::info!(purged, "audit store purged");
        Ok(purged)
    }

    async fn persist(&self, record: &AuditRecord) {
        let path = self.base_dir.join(format!("{}.json", record.id));
        let json = match serde_json::to_string_pretty(record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize audit record {}: {}", record.id, e);
                return;
            }
        };

        match tokio::time::timeout(self.write_timeout, tokio::fs::write(&path, json)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Failed to persist audit record {}: {}", record.id, e);
            }
            Err(_) => {
                tracing::warn!(
                    "Audit write for {} exceeded {:?}, abandoned",
                    record.id,
                    self.write_timeout
                );
            }
        }
    }

    /// Load all record files from a directory, skipping corrupt ones.
    fn load_records(dir: &Path) -> Vec<AuditRecord> {
        let mut records = Vec::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read audit directory {}: {}", dir.display(), e);
                }
                return records;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        records
    }
}
