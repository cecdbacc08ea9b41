//! Offline availability API handlers
//!
//! GET /offline/:version, POST /offline/:version/sync, GET /offline/events

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use lectio_common::events::{EventBus, LectioEvent};
use lectio_common::BibleVersion;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, LookupError, LookupResult};
use crate::services::{OfflineStatus, SyncTracker};
use crate::AppState;

/// GET /offline/:version response
#[derive(Debug, Serialize)]
pub struct OfflineStatusResponse {
    pub version: BibleVersion,
    pub label: String,
    #[serde(flatten)]
    pub status: OfflineStatus,
    /// Verses currently stored locally
    pub verses: u64,
}

/// POST /offline/:version/sync response
#[derive(Debug, Serialize)]
pub struct StartSyncResponse {
    pub sync_id: Uuid,
    pub version: BibleVersion,
    pub started_at: DateTime<Utc>,
}

/// Offline status of `version` combined with its local verse count
pub(crate) async fn offline_status(
    state: &AppState,
    version: BibleVersion,
) -> LookupResult<OfflineStatusResponse> {
    let verses = if version.supports_offline() {
        state.store.count_by_version(version).await?
    } else {
        0
    };

    Ok(OfflineStatusResponse {
        version,
        label: version.label().to_string(),
        status: state.sync_tracker.status(version, verses > 0),
        verses,
    })
}

/// GET /offline/:version
pub async fn get_offline_status(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> ApiResult<Json<OfflineStatusResponse>> {
    let version: BibleVersion = version.parse()?;
    Ok(Json(offline_status(&state, version).await?))
}

/// POST /offline/:version/sync
///
/// Starts a background sync. Returns 202 Accepted with the sync ID; progress
/// is published on the event bus.
pub async fn start_sync(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> ApiResult<(StatusCode, Json<StartSyncResponse>)> {
    let version: BibleVersion = version.parse()?;

    if !version.supports_offline() {
        return Err(LookupError::UnsupportedVersion(version).into());
    }

    let sync_id = Uuid::new_v4();
    if !state.sync_tracker.try_begin(version, sync_id) {
        return Err(ApiError::Conflict(format!(
            "Offline sync already running for {}",
            version
        )));
    }

    let started_at = Utc::now();
    state.event_bus.emit_lossy(LectioEvent::SyncStarted {
        sync_id,
        version,
        timestamp: started_at,
    });

    tracing::info!(sync_id = %sync_id, version = %version, "Offline sync requested");

    let state_clone = state.clone();
    tokio::spawn(async move {
        run_sync(state_clone, version, sync_id).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StartSyncResponse {
            sync_id,
            version,
            started_at,
        }),
    ))
}

/// Message recorded when a sync task ends without an outcome
const SYNC_INTERRUPTED: &str = "Offline sync was interrupted. Try again.";

/// Keeps a sync from staying `Running` forever
///
/// If the sync task panics or is aborted before reporting, dropping the
/// guard marks the version failed and publishes `SyncFailed`.
struct RunningSyncGuard {
    tracker: Arc<SyncTracker>,
    event_bus: EventBus,
    version: BibleVersion,
    sync_id: Uuid,
    settled: bool,
}

impl RunningSyncGuard {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for RunningSyncGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::error!(sync_id = %self.sync_id, version = %self.version, "Sync task ended without an outcome");
        self.tracker.finish_err(self.version, SYNC_INTERRUPTED);
        self.event_bus.emit_lossy(LectioEvent::SyncFailed {
            sync_id: self.sync_id,
            version: self.version,
            error: SYNC_INTERRUPTED.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Background sync task
async fn run_sync(state: AppState, version: BibleVersion, sync_id: Uuid) {
    let guard = RunningSyncGuard {
        tracker: Arc::clone(&state.sync_tracker),
        event_bus: state.event_bus.clone(),
        version,
        sync_id,
        settled: false,
    };

    let tracker = state.sync_tracker.clone();
    let event_bus = state.event_bus.clone();

    let on_progress = move |progress: f64| {
        tracker.set_progress(version, sync_id, progress);
        event_bus.emit_lossy(LectioEvent::SyncProgress {
            sync_id,
            version,
            progress,
            timestamp: Utc::now(),
        });
    };

    let result = state.synchronizer.sync_version(version, on_progress).await;
    guard.settle();

    match result {
        Ok(summary) => {
            state.sync_tracker.finish_ok(version);
            state.event_bus.emit_lossy(LectioEvent::SyncCompleted {
                sync_id,
                version,
                verses: summary.verses,
                duration_ms: summary.duration_ms,
                timestamp: Utc::now(),
            });
            tracing::info!(
                sync_id = %sync_id,
                verses = summary.verses,
                books_cached = summary.books_cached,
                "Background sync task completed"
            );
        }
        Err(e) => {
            let message = e.user_message();
            tracing::error!(sync_id = %sync_id, version = %version, error = %e, "Background sync task failed");

            state.sync_tracker.finish_err(version, message.clone());
            state.record_error(e.to_string()).await;
            state.event_bus.emit_lossy(LectioEvent::SyncFailed {
                sync_id,
                version,
                error: message,
                timestamp: Utc::now(),
            });
        }
    }
}

pub fn offline_routes() -> Router<AppState> {
    Router::new()
        .route("/offline/events", get(crate::api::offline_event_stream))
        .route("/offline/:version", get(get_offline_status))
        .route("/offline/:version/sync", post(start_sync))
}
