//! Hybrid resolver integration tests

mod helpers;

use helpers::{raw_book, remote_chapter, sample_books, small_corpus, temp_store, FakeRemote};
use lectio_common::models::{SearchResult, VerseRecord};
use lectio_common::BibleVersion;
use lectio_offline::services::{HybridResolver, QueryOutcome, Synchronizer, VerseReference};
use lectio_offline::types::VerseStore;
use lectio_offline::LookupError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn synced(remote: FakeRemote) -> (tempfile::TempDir, Arc<FakeRemote>, HybridResolver) {
    let (dir, _pool, store) = temp_store().await;
    let remote = Arc::new(remote);
    Synchronizer::new(store.clone(), remote.clone())
        .sync_version(BibleVersion::Acf, |_| {})
        .await
        .unwrap();
    let resolver = HybridResolver::new(store, remote.clone());
    (dir, remote, resolver)
}

#[tokio::test]
async fn test_non_primary_version_is_never_offline() {
    let (_dir, _pool, store) = temp_store().await;
    store
        .replace_version(
            BibleVersion::Nvi,
            &[VerseRecord::new(BibleVersion::Nvi, "gn", 1, 1, "No princípio")],
        )
        .await
        .unwrap();
    let resolver = HybridResolver::new(store.clone(), Arc::new(FakeRemote::new()));

    assert!(!resolver.is_available_offline(BibleVersion::Nvi).await);
    assert!(!resolver.is_available_offline(BibleVersion::Ra).await);
    assert!(!resolver.is_available_offline(BibleVersion::Acf).await);
}

#[tokio::test]
async fn test_local_chapter_served_without_chapter_request() {
    let (_dir, remote, resolver) =
        synced(FakeRemote::new().with_corpus(small_corpus()).with_books(sample_books())).await;
    assert!(resolver.is_available_offline(BibleVersion::Acf).await);

    let view = resolver
        .get_chapter("gn", 1, BibleVersion::Acf, &CancellationToken::new())
        .await
        .unwrap()
        .expect("chapter");

    let numbers: Vec<u32> = view.verses.iter().map(|v| v.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(view.book.name, "Gênesis");
    assert_eq!(view.book.version, BibleVersion::Acf.label());
    assert_eq!(view.chapter.verses, 3);
    assert_eq!(remote.chapter_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_local_chapter_fetches_descriptors_when_cache_empty() {
    // Given: sync ran while the book list was unreachable
    let (_dir, remote, resolver) = synced(FakeRemote::new().with_corpus(small_corpus())).await;
    remote.set_books(Some(sample_books()));

    // When: reading a local chapter
    let view = resolver
        .get_chapter("jo", 1, BibleVersion::Acf, &CancellationToken::new())
        .await
        .unwrap()
        .expect("chapter");

    // Then: the listing was fetched once and cached for the next read
    assert_eq!(view.book.name, "João");
    let calls_after_first = remote.book_list_calls.load(Ordering::SeqCst);

    resolver
        .get_chapter("gn", 1, BibleVersion::Acf, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(remote.book_list_calls.load(Ordering::SeqCst), calls_after_first);
}

#[tokio::test]
async fn test_missing_descriptor_is_book_not_found() {
    let corpus = vec![raw_book("xx", &[&["texto"]])];
    let (_dir, _remote, resolver) =
        synced(FakeRemote::new().with_corpus(corpus).with_books(sample_books())).await;

    let result = resolver
        .get_chapter("xx", 1, BibleVersion::Acf, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(LookupError::BookNotFound(abbrev)) if abbrev == "xx"));
}

#[tokio::test]
async fn test_remote_chapter_sorted_ascending() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new().with_chapter(remote_chapter(
        "sl",
        23,
        &[(3, "Refrigera a minha alma"), (1, "O Senhor é o meu pastor"), (2, "Deitar-me faz")],
    )));
    let resolver = HybridResolver::new(store, remote.clone());

    let view = resolver
        .get_chapter("sl", 23, BibleVersion::Nvi, &CancellationToken::new())
        .await
        .unwrap()
        .expect("chapter");

    let numbers: Vec<u32> = view.verses.iter().map(|v| v.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(remote.chapter_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_chapter_missing_locally_falls_back_to_remote() {
    let remote = FakeRemote::new()
        .with_corpus(small_corpus())
        .with_books(sample_books())
        .with_chapter(remote_chapter("ex", 20, &[(1, "Então falou Deus")]));
    let (_dir, remote, resolver) = synced(remote).await;

    let view = resolver
        .get_chapter("ex", 20, BibleVersion::Acf, &CancellationToken::new())
        .await
        .unwrap()
        .expect("chapter");

    assert_eq!(view.verses.len(), 1);
    assert_eq!(remote.chapter_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_chapter_request_is_silent() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new());
    remote.hang_chapters.store(true, Ordering::SeqCst);
    let resolver = Arc::new(HybridResolver::new(store, remote.clone()));

    let cancel = CancellationToken::new();
    let task = {
        let resolver = Arc::clone(&resolver);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            resolver
                .get_chapter("gn", 1, BibleVersion::Nvi, &cancel)
                .await
        })
    };

    while remote.chapter_calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("cancelled request should finish")
        .unwrap();
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_get_verse_returns_containing_chapter() {
    let (_dir, _remote, resolver) =
        synced(FakeRemote::new().with_corpus(small_corpus()).with_books(sample_books())).await;

    let view = resolver
        .get_verse("gn", 1, 3, BibleVersion::Acf, &CancellationToken::new())
        .await
        .unwrap()
        .expect("chapter");

    assert_eq!(view.chapter.number, 1);
    assert!(view.verses.iter().any(|v| v.number == 3));
}

#[tokio::test]
async fn test_local_search_counts_beyond_cap() {
    let verses: Vec<String> = (1..=150).map(|n| format!("E houve luz número {}", n)).collect();
    let verse_refs: Vec<&str> = verses.iter().map(String::as_str).collect();
    let corpus = vec![raw_book("gn", &[verse_refs.as_slice()])];
    let (_dir, remote, resolver) =
        synced(FakeRemote::new().with_corpus(corpus).with_books(sample_books())).await;

    let result = resolver.search("LUZ", BibleVersion::Acf).await.unwrap();

    assert_eq!(result.occurrence, 150);
    assert_eq!(result.verses.len(), SearchResult::MAX_VERSES);
    assert_eq!(result.verses[0].book.name, "Gênesis");
    assert_eq!(result.verses[0].number, 1);
    assert_eq!(remote.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_local_matches_do_not_reach_remote() {
    let remote = FakeRemote::new()
        .with_corpus(small_corpus())
        .with_books(sample_books())
        .with_search(SearchResult {
            occurrence: 9,
            verses: Vec::new(),
        });
    let (_dir, remote, resolver) = synced(remote).await;

    let result = resolver.search("inexistente", BibleVersion::Acf).await.unwrap();

    assert_eq!(result, SearchResult::empty());
    assert_eq!(remote.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_names_fall_back_to_abbreviation() {
    // No book list anywhere: names degrade to the abbreviation, never an error
    let (_dir, _remote, resolver) = synced(FakeRemote::new().with_corpus(small_corpus())).await;

    let result = resolver.search("verbo", BibleVersion::Acf).await.unwrap();

    assert_eq!(result.occurrence, 1);
    assert_eq!(result.verses[0].book.name, "jo");
    assert_eq!(result.verses[0].book.abbrev.pt, "jo");
}

#[tokio::test]
async fn test_search_delegates_when_not_offline() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new().with_search(SearchResult {
        occurrence: 3,
        verses: Vec::new(),
    }));
    let resolver = HybridResolver::new(store, remote.clone());

    let result = resolver.search("amor", BibleVersion::Nvi).await.unwrap();

    assert_eq!(result.occurrence, 3);
    assert_eq!(remote.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blank_query_does_no_io() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new());
    let resolver = HybridResolver::new(store, remote.clone());

    assert_eq!(resolver.search("   ", BibleVersion::Nvi).await.unwrap(), SearchResult::empty());
    assert_eq!(
        resolver.lookup("", BibleVersion::Nvi).await.unwrap(),
        QueryOutcome::Results(SearchResult::empty())
    );
    assert_eq!(remote.network_calls(), 0);
}

#[tokio::test]
async fn test_lookup_navigates_on_reference() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new());
    let resolver = HybridResolver::new(store, remote.clone());

    let outcome = resolver.lookup("João 3:16", BibleVersion::Nvi).await.unwrap();

    assert_eq!(
        outcome,
        QueryOutcome::Navigate(VerseReference {
            book_abbrev: "jo".to_string(),
            chapter: 3,
            verse: Some(16),
        })
    );
    assert_eq!(remote.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lookup_keyword_runs_search() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new().with_search(SearchResult {
        occurrence: 42,
        verses: Vec::new(),
    }));
    let resolver = HybridResolver::new(store, remote.clone());

    let outcome = resolver.lookup("amor ao próximo", BibleVersion::Nvi).await.unwrap();

    assert!(matches!(outcome, QueryOutcome::Results(ref r) if r.occurrence == 42));
    assert_eq!(remote.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_list_books_falls_back_to_cache() {
    let (_dir, remote, resolver) =
        synced(FakeRemote::new().with_corpus(small_corpus()).with_books(sample_books())).await;

    remote.set_books(None);
    let books = resolver
        .list_books(&CancellationToken::new())
        .await
        .unwrap()
        .expect("books");

    assert_eq!(books, sample_books());
}

#[tokio::test]
async fn test_list_books_unreadable_remote_falls_back_to_cache() {
    let (_dir, remote, resolver) =
        synced(FakeRemote::new().with_corpus(small_corpus()).with_books(sample_books())).await;

    remote.malformed_books.store(true, Ordering::SeqCst);
    let books = resolver
        .list_books(&CancellationToken::new())
        .await
        .unwrap()
        .expect("books");

    assert_eq!(books, sample_books());
}

#[tokio::test]
async fn test_list_books_unreadable_remote_without_cache_is_parse_error() {
    let (_dir, _pool, store) = temp_store().await;
    let remote = Arc::new(FakeRemote::new());
    remote.malformed_books.store(true, Ordering::SeqCst);
    let resolver = HybridResolver::new(store, remote);

    let result = resolver.list_books(&CancellationToken::new()).await;

    assert!(matches!(result, Err(LookupError::Parse(_))));
}

#[tokio::test]
async fn test_list_books_without_cache_reports_network_error() {
    let (_dir, _pool, store) = temp_store().await;
    let resolver = HybridResolver::new(store, Arc::new(FakeRemote::new()));

    let result = resolver.list_books(&CancellationToken::new()).await;

    assert!(matches!(result, Err(LookupError::Network(_))));
}
