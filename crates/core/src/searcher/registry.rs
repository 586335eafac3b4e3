//! Explicit registry of search engines.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::EngineConfig;

use super::{JackettEngine, SearchEngine, SearchError, TorrentProjectEngine};

/// Ordered set of search engines with unique names.
///
/// Registration order is the tie-break order for equally seeded results.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn SearchEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register the configured engines, in order. `timeout` bounds
    /// each engine's HTTP requests.
    pub fn from_config(engines: &[EngineConfig], timeout: Duration) -> Result<Self, SearchError> {
        let mut registry = Self::new();
        for config in engines {
            let engine: Arc<dyn SearchEngine> = match config {
                EngineConfig::Jackett { name, url, api_key } => Arc::new(JackettEngine::new(
                    name.as_str(),
                    url.as_str(),
                    api_key.clone().unwrap_or_default(),
                    timeout,
                )?),
                EngineConfig::TorrentProject {
                    name,
                    url,
                    cache_url,
                } => Arc::new(TorrentProjectEngine::new(
                    name.as_str(),
                    url.as_str(),
                    cache_url.as_str(),
                    timeout,
                )?),
            };
            registry.register(engine)?;
        }
        Ok(registry)
    }

    /// Add an engine. Fails if an engine with the same name is already
    /// registered.
    pub fn register(&mut self, engine: Arc<dyn SearchEngine>) -> Result<(), SearchError> {
        if self.get(engine.name()).is_some() {
            return Err(SearchError::DuplicateEngine(engine.name().to_string()));
        }
        debug!(engine = engine.name(), "Registered search engine");
        self.engines.push(engine);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SearchEngine>> {
        self.engines.iter().find(|e| e.name() == name)
    }

    pub fn engines(&self) -> &[Arc<dyn SearchEngine>] {
        &self.engines
    }

    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}
