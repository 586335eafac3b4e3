//! Jackett search backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{SearchEngine, SearchError, TorrentCandidate};

/// Jackett category for TV.
const TV_CATEGORY: u32 = 5000;

/// Searches every indexer configured in a Jackett instance through its
/// aggregate endpoint.
#[derive(Debug, Clone)]
pub struct JackettEngine {
    name: String,
    client: Client,
    url: String,
    api_key: String,
}

impl JackettEngine {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        api_key: impl Into<String>,
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
            api_key: api_key.into(),
        })
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}&Category[]={}",
            self.url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query),
            TV_CATEGORY
        )
    }
}

#[async_trait]
impl SearchEngine for JackettEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        let url = self.build_search_url(query);
        debug!(engine = %self.name, query, "Searching Jackett");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SearchError::from_request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.bytes().await.map_err(SearchError::from_request)?;
        let jackett_response: JackettResponse = serde_json::from_slice(&body)
            .map_err(|e| SearchError::Decode(format!("Failed to parse response: {}", e)))?;

        let candidates = jackett_response.into_candidates();
        debug!(
            engine = %self.name,
            results = candidates.len(),
            "Jackett search complete"
        );
        Ok(candidates)
    }
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    Link: Option<String>,
    Seeders: Option<i32>,
}

impl JackettResponse {
    /// Results that can be fetched as a .torrent file. Magnet-only entries
    /// are skipped.
    fn into_candidates(self) -> Vec<TorrentCandidate> {
        self.Results
            .into_iter()
            .filter_map(|r| {
                let link = r.Link.filter(|l| l.starts_with("http://") || l.starts_with("https://"))?;
                Some(TorrentCandidate::new(
                    r.Title,
                    link,
                    r.Seeders.unwrap_or(0).max(0) as u32,
                ))
            })
            .collect()
    }
}
