use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::download::DownloadOptions;
use crate::query::DEFAULT_BATCH_SIZE;
use crate::snippet::DEFAULT_EXPLORE_PROBABILITY;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub engines: Vec<EngineConfig>,
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where downloaded .torrent files are written, typically the watch
    /// directory of a torrent client.
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,
    /// Root of the show store.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            state_dir: default_state_dir(),
        }
    }
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./state")
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchSettings {
    /// Deadline for collecting engine results, per query (default: 3000)
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum episode queries per pass (default: 50)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Chance of trying a random snippet (default: 0.1)
    #[serde(default = "default_explore_probability")]
    pub explore_probability: f64,
    /// Queries dispatched at the same time (default: 4)
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_search_timeout_ms(),
            batch_size: default_batch_size(),
            explore_probability: default_explore_probability(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl SearchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_search_timeout_ms() -> u64 {
    3000
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_explore_probability() -> f64 {
    DEFAULT_EXPLORE_PROBABILITY
}

fn default_max_concurrent_jobs() -> usize {
    4
}

/// Download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadSettings {
    /// Per-download deadline (default: 2000)
    #[serde(default = "default_download_timeout_ms")]
    pub timeout_ms: u64,
    /// Minimum spacing between requests to one host (default: 5000)
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_download_timeout_ms(),
            request_interval_ms: default_request_interval_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl DownloadSettings {
    pub fn options(&self) -> DownloadOptions {
        DownloadOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            request_interval: Duration::from_millis(self.request_interval_ms),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_download_timeout_ms() -> u64 {
    2000
}

fn default_request_interval_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    "getme-rs".to_string()
}

/// A search engine to register, in order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineConfig {
    Jackett {
        name: String,
        /// Jackett server URL (e.g., "http://localhost:9117")
        url: String,
        #[serde(default)]
        api_key: Option<String>,
    },
    TorrentProject {
        name: String,
        #[serde(default = "default_torrent_project_url")]
        url: String,
        /// Torrent cache URL with a `{hash}` placeholder
        #[serde(default = "default_torrent_cache_url")]
        cache_url: String,
    },
}

impl EngineConfig {
    pub fn name(&self) -> &str {
        match self {
            EngineConfig::Jackett { name, .. } | EngineConfig::TorrentProject { name, .. } => name,
        }
    }
}

fn default_torrent_project_url() -> String {
    crate::searcher::DEFAULT_URL.to_string()
}

fn default_torrent_cache_url() -> String {
    crate::searcher::DEFAULT_CACHE_URL.to_string()
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub paths: PathsConfig,
    pub search: SearchSettings,
    pub download: DownloadSettings,
    pub engines: Vec<SanitizedEngineConfig>,
}

/// Sanitized engine config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEngineConfig {
    pub kind: String,
    pub name: String,
    pub url: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            paths: config.paths.clone(),
            search: config.search.clone(),
            download: config.download.clone(),
            engines: config
                .engines
                .iter()
                .map(|engine| match engine {
                    EngineConfig::Jackett { name, url, api_key } => SanitizedEngineConfig {
                        kind: "jackett".to_string(),
                        name: name.clone(),
                        url: url.clone(),
                        api_key_configured: api_key.as_deref().is_some_and(|k| !k.is_empty()),
                    },
                    EngineConfig::TorrentProject { name, url, .. } => SanitizedEngineConfig {
                        kind: "torrent_project".to_string(),
                        name: name.clone(),
                        url: url.clone(),
                        api_key_configured: false,
                    },
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.paths.watch_dir, PathBuf::from("."));
        assert_eq!(config.paths.state_dir, PathBuf::from("./state"));
        assert_eq!(config.search.timeout(), Duration::from_secs(3));
        assert_eq!(config.search.batch_size, 50);
        assert_eq!(config.search.max_concurrent_jobs, 4);
        assert!(config.engines.is_empty());

        let options = config.download.options();
        assert_eq!(options.timeout, Duration::from_secs(2));
        assert_eq!(options.request_interval, Duration::from_secs(5));
        assert_eq!(options.user_agent, "getme-rs");
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let config = Config {
            engines: vec![EngineConfig::Jackett {
                name: "jackett".to_string(),
                url: "http://localhost:9117".to_string(),
                api_key: Some("secret".to_string()),
            }],
            ..Config::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("secret"));
        assert!(sanitized.engines[0].api_key_configured);
    }
}
