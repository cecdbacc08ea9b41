//! Remote Bible API client
//!
//! Talks to the Bible REST API (`/books`, `/verses`, `/search`) and
//! downloads the full corpus document of the primary offline edition.
//! Chapter and book-list requests can be abandoned through a
//! `CancellationToken`, which surfaces as `LookupError::Cancelled`.

use async_trait::async_trait;
use lectio_common::config::TomlConfig;
use lectio_common::models::{BookDescriptor, ChapterView, SearchResult};
use lectio_common::BibleVersion;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, LookupResult};
use crate::types::{RawCorpus, RemoteCorpus};

const USER_AGENT: &str = concat!("lectio-offline/", env!("CARGO_PKG_VERSION"));

/// `POST /search` body
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    version: &'a str,
    search: &'a str,
}

/// HTTP implementation of `RemoteCorpus`
pub struct BibleApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    corpus_url: Url,
}

impl BibleApiClient {
    pub fn new(
        base_url: &str,
        corpus_url: &str,
        api_token: Option<&str>,
        timeout: Duration,
    ) -> lectio_common::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| lectio_common::Error::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        let corpus_url = Url::parse(corpus_url)
            .map_err(|e| lectio_common::Error::Config(format!("Invalid corpus URL '{}': {}", corpus_url, e)))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = api_token.filter(|t| !t.trim().is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| lectio_common::Error::Config(format!("Invalid API token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| lectio_common::Error::Config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            corpus_url,
        })
    }

    pub fn from_config(config: &TomlConfig) -> lectio_common::Result<Self> {
        Self::new(
            &config.api_base_url,
            &config.corpus_url,
            config.api_token.as_deref(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Base URL joined with path segments (each segment percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> LookupResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::Unknown(format!("API base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> LookupResult<T> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(LookupError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Network(format!("GET {} returned {}", url.path(), status)));
        }

        response.json().await.map_err(LookupError::from_reqwest)
    }
}

/// Race `fut` against the token; cancellation drops the in-flight request
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = LookupResult<T>>,
) -> LookupResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LookupError::Cancelled),
        result = fut => result,
    }
}

/// Decode the corpus document against its expected structure
///
/// The published corpus file starts with a UTF-8 byte order mark.
pub fn decode_corpus(bytes: &[u8]) -> LookupResult<RawCorpus> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let corpus: RawCorpus = serde_json::from_slice(bytes)
        .map_err(|e| LookupError::Parse(format!("corpus document: {}", e)))?;

    if let Some(position) = corpus.iter().position(|book| book.abbrev.trim().is_empty()) {
        return Err(LookupError::Parse(format!(
            "corpus document: book #{} has an empty abbreviation",
            position + 1
        )));
    }

    Ok(corpus)
}

#[async_trait]
impl RemoteCorpus for BibleApiClient {
    async fn fetch_book_list(&self, cancel: &CancellationToken) -> LookupResult<Vec<BookDescriptor>> {
        let url = self.endpoint(&["books"])?;
        let books: Vec<BookDescriptor> = cancellable(cancel, self.get_json(url)).await?;

        tracing::debug!(books = books.len(), "Fetched book list");
        Ok(books)
    }

    async fn fetch_chapter(
        &self,
        book_abbrev: &str,
        chapter: u32,
        version: BibleVersion,
        cancel: &CancellationToken,
    ) -> LookupResult<ChapterView> {
        let chapter_segment = chapter.to_string();
        let url = self.endpoint(&["verses", version.as_str(), book_abbrev, &chapter_segment])?;

        let mut view: ChapterView = cancellable(cancel, self.get_json(url)).await?;
        view.normalize_order();

        tracing::debug!(
            book = %book_abbrev,
            chapter,
            version = %version,
            verses = view.verses.len(),
            "Fetched remote chapter"
        );
        Ok(view)
    }

    async fn fetch_full_corpus(&self, version: BibleVersion) -> LookupResult<RawCorpus> {
        if !version.supports_offline() {
            return Err(LookupError::UnsupportedVersion(version));
        }

        tracing::info!(version = %version, url = %self.corpus_url, "Downloading full corpus");

        let response = self
            .http_client
            .get(self.corpus_url.clone())
            .send()
            .await
            .map_err(LookupError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Network(format!(
                "corpus download returned {}",
                status
            )));
        }

        let bytes = response.bytes().await.map_err(LookupError::from_reqwest)?;
        tracing::debug!(bytes = bytes.len(), "Corpus document downloaded");

        decode_corpus(&bytes)
    }

    async fn search(&self, query: &str, version: BibleVersion) -> LookupResult<SearchResult> {
        let url = self.endpoint(&["search"])?;
        tracing::debug!(url = %url, query = %query, version = %version, "POST");

        let response = self
            .http_client
            .post(url)
            .json(&SearchRequest {
                version: version.as_str(),
                search: query,
            })
            .send()
            .await
            .map_err(LookupError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Network(format!("search returned {}", status)));
        }

        response.json().await.map_err(LookupError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> BibleApiClient {
        BibleApiClient::new(base, "http://127.0.0.1:9/acf.json", None, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("https://example.org/api/");
        let url = client.endpoint(&["verses", "acf", "1jo", "3"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/verses/acf/1jo/3");

        let client = self::client("https://example.org/api");
        let url = client.endpoint(&["books"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/books");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = BibleApiClient::new("not a url", "http://x/acf.json", None, Duration::from_secs(1));
        assert!(matches!(result, Err(lectio_common::Error::Config(_))));
    }

    #[test]
    fn test_decode_corpus_with_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(
            br#"[{"abbrev":"gn","name":"Genesis","chapters":[["a","b"],["c"]]}]"#,
        );

        let corpus = decode_corpus(&bytes).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].abbrev, "gn");
        assert_eq!(corpus[0].chapters, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_decode_corpus_rejects_wrong_shape() {
        let result = decode_corpus(br#"[{"abbrev":"gn","chapters":[[1,2]]}]"#);
        assert!(matches!(result, Err(LookupError::Parse(_))));

        let result = decode_corpus(br#"{"books":[]}"#);
        assert!(matches!(result, Err(LookupError::Parse(_))));

        let result = decode_corpus(br#"[{"abbrev":" ","chapters":[]}]"#);
        assert!(matches!(result, Err(LookupError::Parse(_))));
    }

    #[tokio::test]
    async fn test_full_corpus_rejects_non_primary_version() {
        let client = client("http://127.0.0.1:9/api");
        let result = client.fetch_full_corpus(BibleVersion::Nvi).await;
        assert!(matches!(result, Err(LookupError::UnsupportedVersion(BibleVersion::Nvi))));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let client = client("http://127.0.0.1:9/api");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.fetch_book_list(&cancel).await;
        assert!(matches!(result, Err(LookupError::Cancelled)));
    }
}
