//! Torrent acquisition engine.
//!
//! Tracks which seasons and episodes of a show are still missing, searches
//! several torrent engines for them with adaptive queries and downloads the
//! best-seeded results into a watch directory.

pub mod acquisition;
pub mod config;
pub mod download;
pub mod metrics;
pub mod query;
pub mod searcher;
pub mod show;
pub mod snippet;
pub mod store;
pub mod testing;

pub use acquisition::{Acquirer, FoundTorrents, PassReport, SetupError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, EngineConfig,
    SanitizedConfig,
};
pub use download::{DownloadError, DownloadManager, DownloadOptions, DownloadReport};
pub use query::{QueryJob, QueryJobBuilder};
pub use searcher::{
    Dispatch, Dispatcher, EngineRegistry, SearchEngine, SearchError, Torrent, TorrentCandidate,
};
pub use show::{Episode, MediaRef, Season, Show, Snippet, SnippetKind};
pub use snippet::{record_result, SnippetSelector};
pub use store::{Store, StoreError};
