//! Hybrid resolver
//!
//! Single entry point for chapter reads, keyword search and book listings.
//! The primary offline edition is served from the local verse store once
//! it has been synchronized; everything else goes to the remote API.
//! Callers get the same shapes back whichever source answered.

use lectio_common::models::{
    AbbrevRef, BookDescriptor, ChapterView, SearchBook, SearchResult, SearchVerse,
};
use lectio_common::BibleVersion;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, LookupResult};
use crate::services::reference_parser::{parse_reference, VerseReference};
use crate::types::{RemoteCorpus, VerseStore};

/// What a search-box query resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The query named a chapter or verse; open it instead of searching
    Navigate(VerseReference),
    /// Keyword search results
    Results(SearchResult),
}

/// Map a cancelled remote call to `Ok(None)`
fn unless_cancelled<T>(result: LookupResult<T>) -> LookupResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(LookupError::Cancelled) => Ok(None),
        Err(e) => Err(e),
    }
}

pub struct HybridResolver {
    store: Arc<dyn VerseStore>,
    remote: Arc<dyn RemoteCorpus>,
}

impl HybridResolver {
    pub fn new(store: Arc<dyn VerseStore>, remote: Arc<dyn RemoteCorpus>) -> Self {
        Self { store, remote }
    }

    /// True when `version` is the primary offline edition and has local rows
    ///
    /// A store failure is logged and treated as "not available", which
    /// routes the request to the remote API.
    pub async fn is_available_offline(&self, version: BibleVersion) -> bool {
        if !version.supports_offline() {
            return false;
        }

        match self.store.count_by_version(version).await {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!(version = %version, error = %e, "Could not count local verses");
                false
            }
        }
    }

    /// Load one chapter
    ///
    /// Returns `Ok(None)` when `cancel` fired before the chapter arrived.
    pub async fn get_chapter(
        &self,
        book_abbrev: &str,
        chapter: u32,
        version: BibleVersion,
        cancel: &CancellationToken,
    ) -> LookupResult<Option<ChapterView>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        if self.is_available_offline(version).await {
            let records = self.store.query_chapter(version, book_abbrev, chapter).await?;

            if !records.is_empty() {
                let book = match self.find_book(book_abbrev, cancel).await? {
                    Some(book) => book,
                    None => return Ok(None),
                };

                tracing::debug!(
                    book = %book_abbrev,
                    chapter,
                    version = %version,
                    verses = records.len(),
                    "Serving chapter from local store"
                );

                return Ok(Some(ChapterView::from_records(&book, version, chapter, &records)));
            }

            tracing::debug!(
                book = %book_abbrev,
                chapter,
                "Chapter missing from local store, asking remote"
            );
        }

        unless_cancelled(
            self.remote
                .fetch_chapter(book_abbrev, chapter, version, cancel)
                .await,
        )
    }

    /// Load the chapter containing `verse`
    pub async fn get_verse(
        &self,
        book_abbrev: &str,
        chapter: u32,
        verse: u32,
        version: BibleVersion,
        cancel: &CancellationToken,
    ) -> LookupResult<Option<ChapterView>> {
        tracing::debug!(book = %book_abbrev, chapter, verse, "Verse lookup");
        self.get_chapter(book_abbrev, chapter, version, cancel).await
    }

    /// Keyword search
    ///
    /// When the edition is available offline the local store is
    /// authoritative: zero local matches return an empty result without
    /// asking the remote API.
    pub async fn search(&self, query: &str, version: BibleVersion) -> LookupResult<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResult::empty());
        }

        if !self.is_available_offline(version).await {
            let mut result = self.remote.search(query, version).await?;
            result.verses.truncate(SearchResult::MAX_VERSES);
            return Ok(result);
        }

        let matches = self.store.query_by_substring(version, query).await?;
        if matches.is_empty() {
            return Ok(SearchResult::empty());
        }

        let names = self.book_names().await;
        let occurrence = matches.len() as u64;

        let verses = matches
            .into_iter()
            .take(SearchResult::MAX_VERSES)
            .map(|record| {
                let name = names
                    .get(&record.book_abbrev)
                    .cloned()
                    .unwrap_or_else(|| record.book_abbrev.clone());
                SearchVerse {
                    book: SearchBook {
                        abbrev: AbbrevRef {
                            pt: record.book_abbrev,
                        },
                        name,
                    },
                    chapter: record.chapter,
                    number: record.verse,
                    text: record.text,
                }
            })
            .collect();

        tracing::debug!(query = %query, occurrence, "Local search finished");

        Ok(SearchResult { occurrence, verses })
    }

    /// List all books
    ///
    /// The remote listing refreshes the local cache; when the network is
    /// unreachable or answers with an unreadable body, a non-empty cache is
    /// served instead.
    pub async fn list_books(&self, cancel: &CancellationToken) -> LookupResult<Option<Vec<BookDescriptor>>> {
        match self.remote.fetch_book_list(cancel).await {
            Ok(books) => {
                self.cache_books(&books).await;
                Ok(Some(books))
            }
            Err(LookupError::Cancelled) => Ok(None),
            Err(e @ (LookupError::Network(_) | LookupError::Parse(_))) => {
                let cached = self.store.cached_books().await?;
                if cached.is_empty() {
                    return Err(e);
                }
                tracing::info!(
                    books = cached.len(),
                    error = %e,
                    "Remote book list unusable, serving cached descriptors"
                );
                Ok(Some(cached))
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a search-box query
    ///
    /// A recognized verse reference navigates directly and never runs a
    /// keyword search.
    pub async fn lookup(&self, query: &str, version: BibleVersion) -> LookupResult<QueryOutcome> {
        if query.trim().is_empty() {
            return Ok(QueryOutcome::Results(SearchResult::empty()));
        }

        if let Some(reference) = parse_reference(query) {
            tracing::debug!(
                query = %query,
                book = %reference.book_abbrev,
                chapter = reference.chapter,
                verse = ?reference.verse,
                "Query recognized as verse reference"
            );
            return Ok(QueryOutcome::Navigate(reference));
        }

        Ok(QueryOutcome::Results(self.search(query, version).await?))
    }

    /// Descriptor for `book_abbrev`, from the cache or the remote listing
    ///
    /// `Ok(None)` when the remote listing was cancelled.
    async fn find_book(
        &self,
        book_abbrev: &str,
        cancel: &CancellationToken,
    ) -> LookupResult<Option<BookDescriptor>> {
        let mut books = self.store.cached_books().await?;

        if books.is_empty() {
            books = match unless_cancelled(self.remote.fetch_book_list(cancel).await)? {
                Some(books) => books,
                None => return Ok(None),
            };
            self.cache_books(&books).await;
        }

        books
            .into_iter()
            .find(|book| book.abbrev.pt == book_abbrev)
            .map(Some)
            .ok_or_else(|| LookupError::BookNotFound(book_abbrev.to_string()))
    }

    /// Abbreviation -> display name; empty when no source is reachable
    async fn book_names(&self) -> HashMap<String, String> {
        let books = match self.store.cached_books().await {
            Ok(books) if !books.is_empty() => books,
            _ => match self.remote.fetch_book_list(&CancellationToken::new()).await {
                Ok(books) => {
                    self.cache_books(&books).await;
                    books
                }
                Err(e) => {
                    tracing::debug!(error = %e, "No book names available, using abbreviations");
                    Vec::new()
                }
            },
        };

        books
            .into_iter()
            .map(|book| (book.abbrev.pt, book.name))
            .collect()
    }

    async fn cache_books(&self, books: &[BookDescriptor]) {
        if books.is_empty() {
            return;
        }
        if let Err(e) = self.store.replace_books(books).await {
            tracing::warn!(error = %e, "Could not refresh book descriptor cache");
        }
    }
}
