//! Offline synchronizer
//!
//! Downloads the full corpus of the primary offline edition, flattens it
//! into verse records and swaps them into the local store in one
//! transaction. Progress is reported through a caller-supplied callback
//! as a fraction in `[0, 1]`.

use lectio_common::models::VerseRecord;
use lectio_common::BibleVersion;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, LookupResult};
use crate::types::{RawCorpus, RemoteCorpus, VerseStore};

/// Outcome of a successful sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub version: BibleVersion,
    /// Books in the downloaded corpus
    pub books: usize,
    /// Verse records committed
    pub verses: u64,
    pub duration_ms: u64,
    /// Whether the book descriptor cache was refreshed as well
    pub books_cached: bool,
}

/// Monotonic, clamped progress reporting
struct ProgressReporter<F: FnMut(f64)> {
    callback: F,
    last: f64,
}

impl<F: FnMut(f64)> ProgressReporter<F> {
    fn new(callback: F) -> Self {
        Self { callback, last: 0.0 }
    }

    fn report(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let fraction = fraction.max(self.last);
        self.last = fraction;
        (self.callback)(fraction);
    }
}

/// Total number of verses across every chapter of every book
pub fn total_verse_count(corpus: &RawCorpus) -> u64 {
    corpus
        .iter()
        .flat_map(|book| book.chapters.iter())
        .map(|chapter| chapter.len() as u64)
        .sum()
}

/// Synchronizes the local verse store with the remote corpus
pub struct Synchronizer {
    store: Arc<dyn VerseStore>,
    remote: Arc<dyn RemoteCorpus>,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn VerseStore>, remote: Arc<dyn RemoteCorpus>) -> Self {
        Self { store, remote }
    }

    /// Replace the local snapshot of `version` with a fresh download
    ///
    /// Only the primary offline edition can be synchronized; any other
    /// version fails with `UnsupportedVersion` before touching the network.
    /// On failure the previous snapshot is left untouched.
    pub async fn sync_version<F>(&self, version: BibleVersion, on_progress: F) -> LookupResult<SyncSummary>
    where
        F: FnMut(f64) + Send,
    {
        if !version.supports_offline() {
            return Err(LookupError::UnsupportedVersion(version));
        }

        let start = Instant::now();
        let mut progress = ProgressReporter::new(on_progress);
        progress.report(0.0);

        tracing::info!(version = %version, "Starting offline sync");

        let corpus = self.remote.fetch_full_corpus(version).await?;
        let total = total_verse_count(&corpus);

        tracing::debug!(version = %version, books = corpus.len(), total, "Corpus downloaded");

        let mut records: Vec<VerseRecord> = Vec::with_capacity(total as usize);

        if total == 0 {
            progress.report(1.0);
        } else {
            for book in &corpus {
                for (chapter_index, chapter) in book.chapters.iter().enumerate() {
                    for (verse_index, text) in chapter.iter().enumerate() {
                        records.push(VerseRecord::new(
                            version,
                            book.abbrev.as_str(),
                            chapter_index as u32 + 1,
                            verse_index as u32 + 1,
                            text.as_str(),
                        ));
                    }
                }
                progress.report(records.len() as f64 / total as f64);
            }
        }

        self.store.replace_version(version, &records).await?;

        let books_cached = self.refresh_book_cache().await;

        progress.report(1.0);

        let summary = SyncSummary {
            version,
            books: corpus.len(),
            verses: records.len() as u64,
            duration_ms: start.elapsed().as_millis() as u64,
            books_cached,
        };

        tracing::info!(
            version = %version,
            books = summary.books,
            verses = summary.verses,
            duration_ms = summary.duration_ms,
            "Offline sync completed"
        );

        Ok(summary)
    }

    /// Store the remote book listing alongside the verses
    ///
    /// Failure here never fails the sync.
    async fn refresh_book_cache(&self) -> bool {
        let books = match self.remote.fetch_book_list(&CancellationToken::new()).await {
            Ok(books) if !books.is_empty() => books,
            Ok(_) => {
                tracing::warn!("Remote book list was empty, keeping cached descriptors");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not refresh book descriptor cache");
                return false;
            }
        };

        match self.store.replace_books(&books).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Could not store book descriptor cache");
                false
            }
        }
    }
}
