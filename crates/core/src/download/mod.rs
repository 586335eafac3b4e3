//! Torrent downloads.
//!
//! The [`DownloadManager`] fetches winning torrents concurrently. Requests to
//! the same host are spaced by a [`HostPacer`], each fetch is bounded by a
//! timeout and only payloads that decode as torrents are written to disk.

mod manager;
mod pacer;
mod validate;

pub use manager::{
    DownloadError, DownloadManager, DownloadOptions, DownloadOutcome, DownloadReport,
    DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_REQUEST_INTERVAL, DEFAULT_USER_AGENT,
};
pub use pacer::HostPacer;
pub use validate::{validate_torrent, TorrentInfo, TorrentParseError};
