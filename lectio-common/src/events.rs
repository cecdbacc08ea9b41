//! Event types for the Lectio event system
//!
//! Sync progress is broadcast through the EventBus and forwarded to SSE
//! clients by the offline service.

use crate::models::BibleVersion;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Lectio event types
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LectioEvent {
    /// Offline sync started
    SyncStarted {
        /// Sync run identifier
        sync_id: Uuid,
        version: BibleVersion,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Fractional sync progress (0.0 - 1.0)
    SyncProgress {
        sync_id: Uuid,
        version: BibleVersion,
        progress: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sync committed to the local store
    SyncCompleted {
        sync_id: Uuid,
        version: BibleVersion,
        /// Number of verse records committed
        verses: u64,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sync aborted; the previous local snapshot is untouched
    SyncFailed {
        sync_id: Uuid,
        version: BibleVersion,
        /// User-facing error message
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LectioEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            LectioEvent::SyncStarted { .. } => "SyncStarted",
            LectioEvent::SyncProgress { .. } => "SyncProgress",
            LectioEvent::SyncCompleted { .. } => "SyncCompleted",
            LectioEvent::SyncFailed { .. } => "SyncFailed",
        }
    }

    pub fn version(&self) -> BibleVersion {
        match self {
            LectioEvent::SyncStarted { version, .. }
            | LectioEvent::SyncProgress { version, .. }
            | LectioEvent::SyncCompleted { version, .. }
            | LectioEvent::SyncFailed { version, .. } => *version,
        }
    }
}

/// Broadcast bus for LectioEvents
///
/// Cloning shares the same underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LectioEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LectioEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LectioEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_progress() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let sync_id = Uuid::new_v4();

        bus.emit_lossy(LectioEvent::SyncProgress {
            sync_id,
            version: BibleVersion::Acf,
            progress: 0.5,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            LectioEvent::SyncProgress { progress, .. } => assert_eq!(progress, 0.5),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(4);
        let started = |version| LectioEvent::SyncStarted {
            sync_id: Uuid::new_v4(),
            version,
            timestamp: chrono::Utc::now(),
        };

        // No subscribers yet; the event is dropped without error
        bus.emit_lossy(started(BibleVersion::Nvi));

        let mut rx = bus.subscribe();
        bus.emit_lossy(started(BibleVersion::Acf));

        assert_eq!(rx.recv().await.unwrap().version(), BibleVersion::Acf);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = LectioEvent::SyncFailed {
            sync_id: Uuid::nil(),
            version: BibleVersion::Acf,
            error: "offline".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SyncFailed");
        assert_eq!(json["version"], "acf");
        assert_eq!(event.event_type(), "SyncFailed");
    }
}
