//! lectio-offline library interface
//!
//! Offline sync and hybrid lookup for the Bible reader: a local SQLite
//! verse store, the remote Bible API client, the synchronizer that
//! mirrors the primary edition, and the resolver that picks a source per
//! request. The binary serves all of it over HTTP.

pub mod api;
pub mod db;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult, LookupError, LookupResult};

use axum::Router;
use chrono::{DateTime, Utc};
use lectio_common::events::EventBus;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::db::SqliteVerseStore;
use crate::services::{HybridResolver, SyncTracker, Synchronizer};
use crate::types::{RemoteCorpus, VerseStore};

/// Capacity of the sync event channel
pub const EVENT_BUS_CAPACITY: usize = 256;

/// In-flight chapter request of one reader session
#[derive(Clone)]
pub struct ReaderRequest {
    pub request_id: Uuid,
    pub cancel: CancellationToken,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VerseStore>,
    pub resolver: Arc<HybridResolver>,
    pub synchronizer: Arc<Synchronizer>,
    /// Running / failed syncs per version
    pub sync_tracker: Arc<SyncTracker>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Latest chapter request per reader session; a newer one cancels it
    pub reader_sessions: Arc<Mutex<HashMap<String, ReaderRequest>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// State backed by the SQLite verse store on `db`
    pub fn new(db: SqlitePool, remote: Arc<dyn RemoteCorpus>, event_bus: EventBus) -> Self {
        let store: Arc<dyn VerseStore> = Arc::new(SqliteVerseStore::new(db));
        Self {
            resolver: Arc::new(HybridResolver::new(Arc::clone(&store), Arc::clone(&remote))),
            synchronizer: Arc::new(Synchronizer::new(Arc::clone(&store), remote)),
            store,
            sync_tracker: Arc::new(SyncTracker::new()),
            event_bus,
            reader_sessions: Arc::new(Mutex::new(HashMap::new())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::bible_routes())
        .merge(api::offline_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
