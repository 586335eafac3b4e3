//! Mock search engine for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::searcher::{SearchEngine, SearchError, TorrentCandidate};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: String,
    /// When the search was made.
    pub timestamp: Instant,
}

/// A query handler that produces results dynamically based on the query.
type QueryHandler = Box<dyn Fn(&str) -> Option<Vec<TorrentCandidate>> + Send + Sync>;

/// Mock implementation of the [`SearchEngine`] trait.
///
/// Clones share state, so a test can keep a handle after moving the engine
/// into a registry.
///
/// # Example
///
/// ```rust,ignore
/// use getme_core::testing::{fixtures, MockSearchEngine};
///
/// let engine = MockSearchEngine::new("mock");
/// engine.set_results(vec![fixtures::candidate("Show S01E01", 10)]).await;
///
/// let results = engine.search("Show S01E01").await?;
/// assert_eq!(results.len(), 1);
/// assert_eq!(engine.recorded_queries().await, vec!["Show S01E01"]);
/// ```
#[derive(Clone)]
pub struct MockSearchEngine {
    name: String,
    /// Configured results to return.
    results: Arc<RwLock<Vec<TorrentCandidate>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Sleep before answering.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Query handler for dynamic result generation based on query string.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
}

impl std::fmt::Debug for MockSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearchEngine")
            .field("name", &self.name)
            .field("results", &"<results>")
            .field("searches", &"<searches>")
            .field("next_error", &"<next_error>")
            .field("delay", &"<delay>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl MockSearchEngine {
    /// Create a new mock engine with empty results.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            query_handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the results returned for every query.
    pub async fn set_results(&self, results: Vec<TorrentCandidate>) {
        *self.results.write().await = results;
    }

    /// Make the next search fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every answer by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Set a handler that produces results per query. When it returns
    /// `None`, the configured results are used.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Option<Vec<TorrentCandidate>> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Get all recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get only the query strings, in call order.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .map(|s| s.query.clone())
            .collect()
    }

    /// Clear recorded searches.
    pub async fn clear_searches(&self) {
        self.searches.write().await.clear();
    }
}

#[async_trait]
impl SearchEngine for MockSearchEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentCandidate>, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            timestamp: Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(handler) = self.query_handler.read().await.as_ref() {
            if let Some(results) = handler(query) {
                return Ok(results);
            }
        }

        Ok(self.results.read().await.clone())
    }
}
