//! Shared test fixtures: an in-memory remote double and temp-dir databases

#![allow(dead_code)]

use async_trait::async_trait;
use lectio_common::models::{
    AbbrevRef, BookAbbrev, BookDescriptor, ChapterBook, ChapterInfo, ChapterVerse, ChapterView,
    SearchResult, Testament,
};
use lectio_common::BibleVersion;
use lectio_offline::db::SqliteVerseStore;
use lectio_offline::types::{RawBook, RawCorpus, RemoteCorpus};
use lectio_offline::{LookupError, LookupResult};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Scripted `RemoteCorpus` with call counters
///
/// `None` in a slot makes the matching call fail with a network error.
#[derive(Default)]
pub struct FakeRemote {
    pub corpus: Mutex<Option<RawCorpus>>,
    pub books: Mutex<Option<Vec<BookDescriptor>>>,
    pub chapters: Mutex<HashMap<(String, u32), ChapterView>>,
    pub search_result: Mutex<Option<SearchResult>>,
    /// Chapter requests wait until their token is cancelled
    pub hang_chapters: AtomicBool,
    /// When set, the corpus download waits for a `notify_one` first
    pub corpus_gate: Option<Arc<Notify>>,
    /// Book list answers with an unreadable body
    pub malformed_books: AtomicBool,
    /// Corpus download panics instead of returning
    pub panic_corpus: AtomicBool,

    pub corpus_calls: AtomicUsize,
    pub book_list_calls: AtomicUsize,
    pub chapter_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corpus(self, corpus: RawCorpus) -> Self {
        *self.corpus.lock().unwrap() = Some(corpus);
        self
    }

    pub fn with_books(self, books: Vec<BookDescriptor>) -> Self {
        *self.books.lock().unwrap() = Some(books);
        self
    }

    pub fn with_chapter(self, view: ChapterView) -> Self {
        let key = (view.book.abbrev.pt.clone(), view.chapter.number);
        self.chapters.lock().unwrap().insert(key, view);
        self
    }

    pub fn with_search(self, result: SearchResult) -> Self {
        *self.search_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_corpus_gate(mut self, gate: Arc<Notify>) -> Self {
        self.corpus_gate = Some(gate);
        self
    }

    pub fn set_corpus(&self, corpus: Option<RawCorpus>) {
        *self.corpus.lock().unwrap() = corpus;
    }

    pub fn set_books(&self, books: Option<Vec<BookDescriptor>>) {
        *self.books.lock().unwrap() = books;
    }

    pub fn network_calls(&self) -> usize {
        self.corpus_calls.load(Ordering::SeqCst)
            + self.book_list_calls.load(Ordering::SeqCst)
            + self.chapter_calls.load(Ordering::SeqCst)
            + self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCorpus for FakeRemote {
    async fn fetch_book_list(&self, cancel: &CancellationToken) -> LookupResult<Vec<BookDescriptor>> {
        self.book_list_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(LookupError::Cancelled);
        }
        if self.malformed_books.load(Ordering::SeqCst) {
            return Err(LookupError::Parse("expected an array of books".to_string()));
        }
        self.books
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| LookupError::Network("books unavailable".to_string()))
    }

    async fn fetch_chapter(
        &self,
        book_abbrev: &str,
        chapter: u32,
        _version: BibleVersion,
        cancel: &CancellationToken,
    ) -> LookupResult<ChapterView> {
        self.chapter_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_chapters.load(Ordering::SeqCst) {
            cancel.cancelled().await;
        }
        if cancel.is_cancelled() {
            return Err(LookupError::Cancelled);
        }

        let mut view = self
            .chapters
            .lock()
            .unwrap()
            .get(&(book_abbrev.to_string(), chapter))
            .cloned()
            .ok_or_else(|| LookupError::Network("chapter unavailable".to_string()))?;
        view.normalize_order();
        Ok(view)
    }

    async fn fetch_full_corpus(&self, version: BibleVersion) -> LookupResult<RawCorpus> {
        if !version.supports_offline() {
            return Err(LookupError::UnsupportedVersion(version));
        }
        self.corpus_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.corpus_gate {
            gate.notified().await;
        }
        if self.panic_corpus.load(Ordering::SeqCst) {
            panic!("corpus download blew up");
        }

        self.corpus
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| LookupError::Network("corpus unavailable".to_string()))
    }

    async fn search(&self, _query: &str, _version: BibleVersion) -> LookupResult<SearchResult> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| LookupError::Network("search unavailable".to_string()))
    }
}

/// SQLite store in a temp directory (kept alive by the returned `TempDir`)
pub async fn temp_store() -> (TempDir, SqlitePool, Arc<SqliteVerseStore>) {
    let dir = TempDir::new().unwrap();
    let pool = lectio_common::db::init_database(&dir.path().join("lectio.db"))
        .await
        .unwrap();
    let store = Arc::new(SqliteVerseStore::new(pool.clone()));
    (dir, pool, store)
}

pub fn book(pt: &str, name: &str, chapters: u32, testament: Testament) -> BookDescriptor {
    BookDescriptor {
        abbrev: BookAbbrev {
            pt: pt.to_string(),
            en: pt.to_string(),
        },
        name: name.to_string(),
        author: "Autor".to_string(),
        chapters,
        group: "Grupo".to_string(),
        testament,
    }
}

pub fn sample_books() -> Vec<BookDescriptor> {
    vec![
        book("gn", "Gênesis", 50, Testament::Old),
        book("ex", "Êxodo", 40, Testament::Old),
        book("jo", "João", 21, Testament::New),
    ]
}

pub fn raw_book(abbrev: &str, chapters: &[&[&str]]) -> RawBook {
    RawBook {
        abbrev: abbrev.to_string(),
        chapters: chapters
            .iter()
            .map(|verses| verses.iter().map(|v| v.to_string()).collect())
            .collect(),
    }
}

/// Two books, one chapter each, three verses per chapter
pub fn small_corpus() -> RawCorpus {
    vec![
        raw_book(
            "gn",
            &[&[
                "No princípio criou Deus os céus e a terra.",
                "E a terra era sem forma e vazia.",
                "E disse Deus: Haja luz; e houve luz.",
            ]],
        ),
        raw_book(
            "jo",
            &[&[
                "No princípio era o Verbo.",
                "Ele estava no princípio com Deus.",
                "Todas as coisas foram feitas por ele.",
            ]],
        ),
    ]
}

/// Remote chapter view with verses in the given (possibly unordered) order
pub fn remote_chapter(book: &str, chapter: u32, verses: &[(u32, &str)]) -> ChapterView {
    ChapterView {
        book: ChapterBook {
            abbrev: AbbrevRef { pt: book.to_string() },
            name: book.to_uppercase(),
            author: "Autor".to_string(),
            group: "Grupo".to_string(),
            version: BibleVersion::Nvi.label().to_string(),
        },
        chapter: ChapterInfo {
            number: chapter,
            verses: verses.len() as u32,
        },
        verses: verses
            .iter()
            .map(|(number, text)| ChapterVerse {
                number: *number,
                text: text.to_string(),
            })
            .collect(),
    }
}
