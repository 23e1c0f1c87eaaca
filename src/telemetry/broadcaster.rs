//! Best-effort pub/sub fan-out to live observers
//!
//! Two addressing modes: broadcast-to-all and room-addressed. Delivery is
//! at-most-once with no replay — an observer that is not connected when a
//! frame is published never sees it. Frames reach each observer over its own
//! FIFO channel, so per-publisher/per-observer order matches publish order;
//! there is no cross-topic guarantee.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// A frame delivered to observers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub topic: String,
    pub payload: serde_json::Value,
    /// Set when the frame was room-addressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Millisecond epoch publish time
    pub timestamp: i64,
}

/// A subscribed observer: an id plus the receiving end of its channel.
pub struct Observer {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl Observer {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive the next frame; `None` once the broadcaster dropped this
    /// observer.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

struct Inner {
    observers: HashMap<Uuid, mpsc::UnboundedSender<Envelope>>,
    rooms: HashMap<String, HashSet<Uuid>>,
}

/// Pub/sub fan-out hub.
///
/// A coarse lock over membership and delivery is sufficient at the expected
/// observer cardinality.
pub struct Broadcaster {
    inner: Arc<RwLock<Inner>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                observers: HashMap::new(),
                rooms: HashMap::new(),
            })),
        }
    }

    /// Register a new observer and hand back its receiving end.
    pub async fn subscribe(&self) -> Observer {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.inner.write().await.observers.insert(id, tx);
        tracing::debug!(observer = %id, "observer subscribed");
        Observer { id, rx }
    }

    /// Drop an observer and its room memberships.
    pub async fn unsubscribe(&self, id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.observers.remove(&id);
        for members in inner.rooms.values_mut() {
            members.remove(&id);
        }
        inner.rooms.retain(|_, members| !members.is_empty());
    }

    /// Join a named room. Membership is non-exclusive.
    pub async fn join(&self, room: &str, id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.rooms.entry(room.to_string()).or_default().insert(id);
    }

    /// Leave a named room.
    pub async fn leave(&self, room: &str, id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
    }

    /// Publish a frame to all observers, or to a room's members only.
    ///
    /// Returns the number of observers the frame was handed to. A room with
    /// no members is a no-op, not an error. Observers whose channel has
    /// closed are pruned on the way.
    pub async fn publish(
        &self,
        topic: &str,
        payload: serde_json::Value,
        room: Option<&str>,
    ) -> usize {
        let envelope = Envelope {
            topic: topic.to_string(),
            payload,
            room: room.map(|r| r.to_string()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let mut inner = self.inner.write().await;

        let targets: Vec<Uuid> = match room {
            Some(name) => inner
                .rooms
                .get(name)
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default(),
            None => inner.observers.keys().copied().collect(),
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for id in targets {
            match inner.observers.get(&id) {
                Some(tx) => {
                    if tx.send(envelope.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        dead.push(id);
                    }
                }
                None => dead.push(id),
            }
        }

        for id in dead {
            inner.observers.remove(&id);
            for members in inner.rooms.values_mut() {
                members.remove(&id);
            }
        }
        inner.rooms.retain(|_, members| !members.is_empty());

        delivered
    }

    /// Number of live observers.
    pub async fn observer_count(&self) -> usize {
        self.inner.read().await.observers.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
