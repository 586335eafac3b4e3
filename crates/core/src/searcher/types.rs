//! Types for the torrent search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::show::MediaRef;

/// A single result reported by a search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentCandidate {
    /// Release title as listed by the engine.
    pub title: String,
    /// Where the .torrent file can be fetched.
    pub url: String,
    /// Name to store the file under.
    pub filename: String,
    pub seeders: u32,
}

impl TorrentCandidate {
    /// Build a candidate, deriving the filename from the title.
    pub fn new(title: impl Into<String>, url: impl Into<String>, seeders: u32) -> Self {
        let title = title.into();
        Self {
            filename: torrent_filename(&title),
            title,
            url: url.into(),
            seeders,
        }
    }
}

/// A search winner, tied to the item it should acquire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torrent {
    pub url: String,
    pub filename: String,
    pub title: String,
    pub seeders: u32,
    pub media: MediaRef,
}

impl Torrent {
    pub fn from_candidate(candidate: TorrentCandidate, media: MediaRef) -> Self {
        Self {
            url: candidate.url,
            filename: candidate.filename,
            title: candidate.title,
            seeders: candidate.seeders,
            media,
        }
    }
}

/// Filename for a torrent title. Anything outside `[A-Za-z0-9 ._-]` becomes
/// `_` so the name is safe on every filesystem.
pub fn torrent_filename(title: &str) -> String {
    let mut name: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        name.push_str("unnamed");
    }
    name.push_str(".torrent");
    name
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Failed to decode search response: {0}")]
    Decode(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Search engine registered twice: {0}")]
    DuplicateEngine(String),

    #[error("Search deadline reached with {outstanding} engine(s) outstanding")]
    DispatchTimeout { outstanding: usize },
}

impl SearchError {
    pub(crate) fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// A torrent search backend.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Engine name for logging and registry lookups. Must be unique.
    fn name(&self) -> &str;

    /// Run a free-text query and return every result, unfiltered.
    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError>;
}
