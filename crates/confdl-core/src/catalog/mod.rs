//! Session catalog: the record model and the one-shot fetch that produces it.

mod parse;

use serde::Deserialize;

use crate::downloader::{self, CurlOptions};
use crate::retry::{run_with_retry, RetryPolicy, TransferError};

pub use parse::decode_sessions;

/// One conference session as published by the catalog API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    /// Session code such as `THR2120`. May be empty.
    #[serde(deserialize_with = "parse::null_as_empty")]
    pub session_code: String,
    #[serde(deserialize_with = "parse::null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "parse::null_as_empty")]
    pub topic: String,
    /// 100, 200, 300 or 400 when present.
    #[serde(deserialize_with = "parse::level")]
    pub level: Option<u32>,
    #[serde(deserialize_with = "parse::string_or_list")]
    pub products: Vec<String>,
    #[serde(deserialize_with = "parse::string_or_list")]
    pub speaker_names: Vec<String>,
    #[serde(deserialize_with = "parse::string_or_list")]
    pub speaker_companies: Vec<String>,
    #[serde(deserialize_with = "parse::optional_link")]
    pub download_video_link: Option<String>,
    #[serde(deserialize_with = "parse::optional_link")]
    pub slide_deck: Option<String>,
}

/// Fatal catalog problems. Any of these ends the run before filtering.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("could not fetch session catalog from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: TransferError,
    },
    #[error("session catalog is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("session catalog contains no sessions")]
    Empty,
}

/// The fetched session list. Never empty, never mutated after construction.
#[derive(Debug, Clone)]
pub struct Catalog {
    sessions: Vec<SessionRecord>,
}

impl Catalog {
    /// Wrap fetched sessions; an empty list is `CatalogError::Empty`.
    pub fn new(sessions: Vec<SessionRecord>) -> Result<Self, CatalogError> {
        if sessions.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { sessions })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SessionRecord> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a SessionRecord;
    type IntoIter = std::slice::Iter<'a, SessionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.iter()
    }
}

/// Where the catalog comes from. Called once per run, from a blocking thread.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> Result<Catalog, CatalogError>;
}

/// Catalog fetched with a single HTTP GET (retried per policy).
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    url: String,
    curl: CurlOptions,
    retry: RetryPolicy,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>, curl: CurlOptions, retry: RetryPolicy) -> Self {
        Self {
            url: url.into(),
            curl,
            retry,
        }
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch(&self) -> Result<Catalog, CatalogError> {
        tracing::info!(url = %self.url, "fetching session catalog");
        let body = run_with_retry(&self.retry, || downloader::get_bytes(&self.url, &self.curl))
            .map_err(|source| CatalogError::Fetch {
                url: self.url.clone(),
                source,
            })?;
        let sessions = decode_sessions(&body)?;
        tracing::info!(sessions = sessions.len(), bytes = body.len(), "catalog decoded");
        Catalog::new(sessions)
    }
}
