//! Core trait definitions
//!
//! The synchronizer and the hybrid resolver only see these two seams, so
//! the SQLite store and the HTTP client can be swapped for test doubles.

use async_trait::async_trait;
use lectio_common::models::{BookDescriptor, ChapterView, SearchResult, VerseRecord};
use lectio_common::BibleVersion;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::LookupResult;

// ============================================================================
// Raw corpus document
// ============================================================================

/// One book of the full corpus document
///
/// `chapters[c][v]` is the text of chapter `c + 1`, verse `v + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawBook {
    pub abbrev: String,
    pub chapters: Vec<Vec<String>>,
}

/// Full text of one edition, books in canonical order
pub type RawCorpus = Vec<RawBook>;

// ============================================================================
// Local Verse Store
// ============================================================================

/// Persistent verse storage
///
/// Written only by the synchronizer, read by the resolver.
#[async_trait]
pub trait VerseStore: Send + Sync {
    /// Number of stored verses for `version`
    async fn count_by_version(&self, version: BibleVersion) -> lectio_common::Result<u64>;

    /// Verses of one chapter, ascending by verse number
    async fn query_chapter(
        &self,
        version: BibleVersion,
        book_abbrev: &str,
        chapter: u32,
    ) -> lectio_common::Result<Vec<VerseRecord>>;

    /// Verses of `version` whose text contains `needle`, ignoring case
    async fn query_by_substring(
        &self,
        version: BibleVersion,
        needle: &str,
    ) -> lectio_common::Result<Vec<VerseRecord>>;

    /// Atomically swap every verse of `version` for `records`
    async fn replace_version(
        &self,
        version: BibleVersion,
        records: &[VerseRecord],
    ) -> lectio_common::Result<()>;

    /// Locally cached book descriptors, canonical order
    async fn cached_books(&self) -> lectio_common::Result<Vec<BookDescriptor>>;

    /// Atomically swap the book descriptor cache
    async fn replace_books(&self, books: &[BookDescriptor]) -> lectio_common::Result<()>;
}

// ============================================================================
// Remote Corpus Fetcher
// ============================================================================

/// Remote Bible REST API plus the static full-corpus document
#[async_trait]
pub trait RemoteCorpus: Send + Sync {
    /// `GET /books`
    async fn fetch_book_list(&self, cancel: &CancellationToken) -> LookupResult<Vec<BookDescriptor>>;

    /// `GET /verses/{version}/{book}/{chapter}`
    async fn fetch_chapter(
        &self,
        book_abbrev: &str,
        chapter: u32,
        version: BibleVersion,
        cancel: &CancellationToken,
    ) -> LookupResult<ChapterView>;

    /// Full text of the primary offline edition
    async fn fetch_full_corpus(&self, version: BibleVersion) -> LookupResult<RawCorpus>;

    /// `POST /search`
    async fn search(&self, query: &str, version: BibleVersion) -> LookupResult<SearchResult>;
}
