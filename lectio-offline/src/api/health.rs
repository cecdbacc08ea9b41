//! Health check endpoint
//!
//! Besides liveness, reports whether the primary edition can be read
//! offline. A store that cannot be queried marks the service degraded.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use lectio_common::BibleVersion;
use serde::Serialize;

use crate::api::offline::{offline_status, OfflineStatusResponse};
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the local store is unreadable
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Offline state of the primary edition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<OfflineStatusResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    let offline = match offline_status(&state, BibleVersion::PRIMARY_OFFLINE).await {
        Ok(offline) => Some(offline),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the verse store");
            None
        }
    };

    Json(HealthResponse {
        status: if offline.is_some() { "ok" } else { "degraded" },
        module: "lectio-offline",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        offline,
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
