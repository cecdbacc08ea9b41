//! Offline status tracking
//!
//! Remembers which sync is running (and how far it got) or why the last
//! one failed, per version. Also acts as the single-writer guard: a second
//! sync for a version that is already syncing is refused.

use lectio_common::BibleVersion;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Offline state of one edition as shown to readers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OfflineStatus {
    /// The edition cannot be mirrored locally
    Unsupported,
    /// Supported but never synchronized
    Unavailable,
    Syncing { progress: f64 },
    Synced,
    /// The last sync failed
    Error { message: String },
}

#[derive(Debug, Clone)]
enum SyncState {
    Running { sync_id: Uuid, progress: f64 },
    Failed { message: String },
}

/// Per-version sync state
///
/// Uses a std mutex: progress updates come from a synchronous callback and
/// no lock is held across an await.
#[derive(Debug, Default)]
pub struct SyncTracker {
    states: Mutex<HashMap<BibleVersion, SyncState>>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn states(&self) -> MutexGuard<'_, HashMap<BibleVersion, SyncState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark `version` as syncing; `false` if a sync is already running
    pub fn try_begin(&self, version: BibleVersion, sync_id: Uuid) -> bool {
        let mut states = self.states();
        if matches!(states.get(&version), Some(SyncState::Running { .. })) {
            return false;
        }
        states.insert(version, SyncState::Running { sync_id, progress: 0.0 });
        true
    }

    /// Record progress of the running sync `sync_id`
    pub fn set_progress(&self, version: BibleVersion, sync_id: Uuid, progress: f64) {
        if let Some(SyncState::Running { sync_id: running, progress: current }) =
            self.states().get_mut(&version)
        {
            if *running == sync_id {
                *current = progress;
            }
        }
    }

    pub fn finish_ok(&self, version: BibleVersion) {
        self.states().remove(&version);
    }

    pub fn finish_err(&self, version: BibleVersion, message: impl Into<String>) {
        self.states().insert(
            version,
            SyncState::Failed {
                message: message.into(),
            },
        );
    }

    /// Combine the tracked state with local availability
    pub fn status(&self, version: BibleVersion, available_offline: bool) -> OfflineStatus {
        if !version.supports_offline() {
            return OfflineStatus::Unsupported;
        }

        match self.states().get(&version) {
            Some(SyncState::Running { progress, .. }) => OfflineStatus::Syncing {
                progress: *progress,
            },
            Some(SyncState::Failed { message }) => OfflineStatus::Error {
                message: message.clone(),
            },
            None if available_offline => OfflineStatus::Synced,
            None => OfflineStatus::Unavailable,
        }
    }
}
