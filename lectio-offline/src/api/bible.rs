//! Reader API handlers
//!
//! GET /books, GET /verses/..., POST /search, GET /lookup

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use lectio_common::models::{BookDescriptor, ChapterView, SearchResult};
use lectio_common::BibleVersion;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, LookupError};
use crate::services::QueryOutcome;
use crate::{AppState, ReaderRequest};

/// GET /verses query string
#[derive(Debug, Default, Deserialize)]
pub struct ChapterQuery {
    /// Reader session; a newer chapter request supersedes the older one
    pub session: Option<String>,
}

/// POST /search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub version: String,
    pub search: String,
}

/// GET /lookup query string
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub q: String,
    pub version: Option<String>,
}

fn parse_version(raw: &str) -> ApiResult<BibleVersion> {
    Ok(raw.parse::<BibleVersion>()?)
}

fn validate_position(name: &str, value: u32) -> ApiResult<()> {
    if value == 0 {
        return Err(ApiError::BadRequest(format!("{} must be a positive number", name)));
    }
    Ok(())
}

/// `Ok(None)` from the resolver means the request was cancelled (204)
fn require<T>(value: Option<T>) -> ApiResult<Json<T>> {
    value.map(Json).ok_or(ApiError::Lookup(LookupError::Cancelled))
}

type ReaderSessions = Arc<Mutex<HashMap<String, ReaderRequest>>>;

fn lock_sessions(sessions: &ReaderSessions) -> MutexGuard<'_, HashMap<String, ReaderRequest>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Chapter request registered under a reader session
///
/// Dropping it removes the session entry unless a newer request already
/// replaced it. Runs whether the handler finishes or axum drops it after a
/// client disconnect.
struct ReaderRequestGuard {
    sessions: ReaderSessions,
    session: Option<String>,
    request_id: Uuid,
    cancel: CancellationToken,
}

impl ReaderRequestGuard {
    /// Register a chapter request for `session`, cancelling the previous one
    fn begin(state: &AppState, session: Option<String>) -> Self {
        let request = ReaderRequest {
            request_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        };

        if let Some(session) = session.as_deref() {
            let previous = lock_sessions(&state.reader_sessions).insert(session.to_string(), request.clone());
            if let Some(previous) = previous {
                tracing::debug!(
                    session = %session,
                    superseded = %previous.request_id,
                    "Cancelling superseded chapter request"
                );
                previous.cancel.cancel();
            }
        }

        Self {
            sessions: Arc::clone(&state.reader_sessions),
            session,
            request_id: request.request_id,
            cancel: request.cancel,
        }
    }
}

impl Drop for ReaderRequestGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_deref() {
            let mut sessions = lock_sessions(&self.sessions);
            if sessions
                .get(session)
                .is_some_and(|current| current.request_id == self.request_id)
            {
                sessions.remove(session);
            }
        }
    }
}

/// GET /books
pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<Vec<BookDescriptor>>> {
    let books = state.resolver.list_books(&CancellationToken::new()).await?;
    require(books)
}

/// GET /verses/:version/:book/:chapter
///
/// Returns 204 when a newer request of the same reader session
/// superseded this one.
pub async fn get_chapter(
    State(state): State<AppState>,
    Path((version, book, chapter)): Path<(String, String, u32)>,
    Query(query): Query<ChapterQuery>,
) -> ApiResult<Json<ChapterView>> {
    let version = parse_version(&version)?;
    validate_position("chapter", chapter)?;

    let request = ReaderRequestGuard::begin(&state, query.session);

    let view = state
        .resolver
        .get_chapter(&book, chapter, version, &request.cancel)
        .await?;

    require(view)
}

/// GET /verses/:version/:book/:chapter/:verse
pub async fn get_verse(
    State(state): State<AppState>,
    Path((version, book, chapter, verse)): Path<(String, String, u32, u32)>,
) -> ApiResult<Json<ChapterView>> {
    let version = parse_version(&version)?;
    validate_position("chapter", chapter)?;
    validate_position("verse", verse)?;

    let view = state
        .resolver
        .get_verse(&book, chapter, verse, version, &CancellationToken::new())
        .await?;
    require(view)
}

/// POST /search
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResult>> {
    let version = parse_version(&request.version)?;
    let result = state.resolver.search(&request.search, version).await?;
    Ok(Json(result))
}

/// GET /lookup?q=&version=
///
/// Verse references navigate; anything else is a keyword search.
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<QueryOutcome>> {
    let version = match query.version.as_deref() {
        Some(raw) => parse_version(raw)?,
        None => BibleVersion::PRIMARY_OFFLINE,
    };

    let outcome = state.resolver.lookup(&query.q, version).await?;
    Ok(Json(outcome))
}

pub fn bible_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/verses/:version/:book/:chapter", get(get_chapter))
        .route("/verses/:version/:book/:chapter/:verse", get(get_verse))
        .route("/search", post(search))
        .route("/lookup", get(lookup))
}
