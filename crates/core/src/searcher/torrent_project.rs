//! TorrentProject search backend.
//!
//! The JSON API answers with an object whose numbered keys (`"1"`, `"2"`, …)
//! hold the results, next to bookkeeping keys such as `total_found`. Results
//! only carry an info hash, so the download URL comes from a torrent cache.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{SearchEngine, SearchError, TorrentCandidate};

pub const DEFAULT_URL: &str = "https://torrentproject.se";

/// Cache URL template. `{hash}` is replaced by the info hash.
pub const DEFAULT_CACHE_URL: &str = "http://torcache.net/torrent/{hash}.torrent";

#[derive(Debug, Clone)]
pub struct TorrentProjectEngine {
    name: String,
    client: Client,
    url: String,
    cache_url: String,
}

impl TorrentProjectEngine {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        cache_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::ConnectionFailed(format!("HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            client,
            url: url.into(),
            cache_url: cache_url.into(),
        })
    }

    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/?s={}&out=json&orderby=seeds",
            self.url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    fn torrent_url(&self, hash: &str) -> String {
        self.cache_url.replace("{hash}", hash)
    }

    fn parse_results(&self, body: &[u8]) -> Result<Vec<TorrentCandidate>, SearchError> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(body)
            .map_err(|e| SearchError::Decode(format!("Failed to parse response: {}", e)))?;

        let mut items: Vec<(u32, TorrentProjectItem)> = Vec::new();
        for (key, value) in raw {
            // Skip bookkeeping keys.
            let Ok(position) = key.parse::<u32>() else {
                continue;
            };
            let item: TorrentProjectItem = serde_json::from_value(value)
                .map_err(|e| SearchError::Decode(format!("Result {}: {}", key, e)))?;
            if !item.torrent_hash.is_empty() {
                items.push((position, item));
            }
        }
        items.sort_by_key(|(position, _)| *position);

        Ok(items
            .into_iter()
            .map(|(_, item)| {
                let url = self.torrent_url(&item.torrent_hash);
                TorrentCandidate::new(item.title, url, item.seeds)
            })
            .collect())
    }
}

#[async_trait]
impl SearchEngine for TorrentProjectEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        let url = self.build_search_url(query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SearchError::from_request)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(engine = %self.name, query, "No torrents found");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(SearchError::ApiError(format!("HTTP {}", response.status())));
        }

        let body = response.bytes().await.map_err(SearchError::from_request)?;
        let candidates = self.parse_results(&body)?;
        debug!(
            engine = %self.name,
            results = candidates.len(),
            "TorrentProject search complete"
        );
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
struct TorrentProjectItem {
    title: String,
    #[serde(default)]
    seeds: u32,
    #[serde(default)]
    torrent_hash: String,
}
