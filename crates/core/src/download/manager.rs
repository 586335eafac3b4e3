//! Concurrent, per-host paced torrent downloads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::metrics::{DOWNLOADS_TOTAL, DOWNLOAD_DURATION, PACING_WAIT};
use crate::searcher::Torrent;
use crate::show::Show;

use super::pacer::HostPacer;
use super::validate::{validate_torrent, TorrentParseError};

pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_USER_AGENT: &str = "getme-rs";

/// Runtime download settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Deadline for one fetch, pacing excluded.
    pub timeout: Duration,
    /// Minimum spacing between two requests to the same host.
    pub request_interval: Duration,
    pub user_agent: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            request_interval: DEFAULT_REQUEST_INTERVAL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Errors that can occur while downloading one torrent.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid torrent URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid torrent from {url}: {source}")]
    InvalidTorrent {
        url: String,
        #[source]
        source: TorrentParseError,
    },

    #[error("Failed to write {} for {url}: {source}", .path.display())]
    Io {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
}

impl DownloadError {
    /// URL of the torrent that failed, if the error is tied to one.
    pub fn url(&self) -> Option<&str> {
        match self {
            DownloadError::Client(_) => None,
            DownloadError::InvalidUrl { url, .. }
            | DownloadError::Http { url, .. }
            | DownloadError::Status { url, .. }
            | DownloadError::InvalidTorrent { url, .. }
            | DownloadError::Io { url, .. }
            | DownloadError::Timeout { url, .. } => Some(url),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DownloadError::Timeout { .. })
    }
}

/// Result of downloading one torrent.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub torrent: Torrent,
    /// Path of the written file.
    pub result: Result<PathBuf, DownloadError>,
}

/// Result of [`DownloadManager::download`].
///
/// `last_error` is only a signal: other torrents of the same call may have
/// been stored successfully, see `completed`.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub completed: Vec<Torrent>,
    pub failed: usize,
    pub last_error: Option<DownloadError>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Downloads torrent files into a directory.
#[derive(Debug)]
pub struct DownloadManager {
    client: Client,
    pacer: HostPacer,
    timeout: Duration,
    part_seq: AtomicU64,
}

impl DownloadManager {
    pub fn new(options: DownloadOptions) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(DownloadError::Client)?;

        Ok(Self {
            client,
            pacer: HostPacer::new(options.request_interval),
            timeout: options.timeout,
            part_seq: AtomicU64::new(0),
        })
    }

    /// Download every torrent concurrently into `destination` and mark the
    /// media of each stored torrent as done on `show`.
    pub async fn download(
        &self,
        show: &mut Show,
        torrents: &[Torrent],
        destination: &Path,
    ) -> DownloadReport {
        let mut report = DownloadReport::default();

        for outcome in self.download_all(torrents, destination).await {
            match outcome.result {
                Ok(_) => {
                    if !show.mark_done(&outcome.torrent.media) {
                        warn!(
                            show = %show.title,
                            media = %outcome.torrent.media,
                            "Downloaded torrent for unknown media"
                        );
                    }
                    report.completed.push(outcome.torrent);
                }
                Err(e) => {
                    report.failed += 1;
                    report.last_error = Some(e);
                }
            }
        }

        report
    }

    /// Download every torrent concurrently. Outcomes are in input order.
    pub async fn download_all(&self, torrents: &[Torrent], destination: &Path) -> Vec<DownloadOutcome> {
        let downloads = torrents.iter().map(|torrent| async move {
            DownloadOutcome {
                torrent: torrent.clone(),
                result: self.download_one(torrent, destination).await,
            }
        });
        futures::future::join_all(downloads).await
    }

    /// Fetch one torrent, respecting its host's pacing, and store it as
    /// `<destination>/<filename>`.
    ///
    /// The body is written to a hidden part file that is renamed into place
    /// once complete. On failure only that part file is removed, so a
    /// concurrent download of the same filename is never clobbered.
    pub async fn download_one(
        &self,
        torrent: &Torrent,
        destination: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let url = Url::parse(&torrent.url).map_err(|e| DownloadError::InvalidUrl {
            url: torrent.url.clone(),
            reason: e.to_string(),
        })?;
        let host = pacing_key(&url).ok_or_else(|| DownloadError::InvalidUrl {
            url: torrent.url.clone(),
            reason: "missing host".to_string(),
        })?;

        let waited = self.pacer.wait(&host).await;
        PACING_WAIT
            .with_label_values(&[])
            .observe(waited.as_secs_f64());

        let path = destination.join(&torrent.filename);
        let part = self.part_path(destination, &torrent.filename);
        let created = AtomicBool::new(false);
        let start = Instant::now();

        let fetch = self.fetch(&url, &path, &part, &created);
        let result = match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(DownloadError::Timeout {
                url: torrent.url.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        let label = match &result {
            Ok(_) => "success",
            Err(e) if e.is_timeout() => "timeout",
            Err(_) => "failed",
        };
        DOWNLOADS_TOTAL.with_label_values(&[label]).inc();
        DOWNLOAD_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(bytes) => {
                info!(
                    torrent = %torrent.title,
                    host = %host,
                    path = %path.display(),
                    bytes,
                    "Downloaded torrent"
                );
                Ok(path)
            }
            Err(e) => {
                warn!(torrent = %torrent.title, host = %host, error = %e, "Download failed");
                if created.load(Ordering::SeqCst) {
                    remove_partial(&part).await;
                }
                Err(e)
            }
        }
    }

    /// Unique scratch name next to the final file, invisible to torrent
    /// clients watching for `*.torrent`.
    fn part_path(&self, destination: &Path, filename: &str) -> PathBuf {
        let seq = self.part_seq.fetch_add(1, Ordering::Relaxed);
        destination.join(format!(".{}.{}-{}.part", filename, std::process::id(), seq))
    }

    async fn fetch(
        &self,
        url: &Url,
        path: &Path,
        part: &Path,
        created: &AtomicBool,
    ) -> Result<usize, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| DownloadError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| DownloadError::Http {
            url: url.to_string(),
            source,
        })?;

        let info = validate_torrent(&body).map_err(|source| DownloadError::InvalidTorrent {
            url: url.to_string(),
            source,
        })?;
        debug!(
            url = %url,
            name = ?info.name,
            info_hash = %info.info_hash,
            "Fetched valid torrent"
        );

        let part_error = |source| DownloadError::Io {
            url: url.to_string(),
            path: part.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(part).await.map_err(part_error)?;
        created.store(true, Ordering::SeqCst);
        file.write_all(&body).await.map_err(part_error)?;
        file.flush().await.map_err(part_error)?;
        drop(file);

        tokio::fs::rename(part, path)
            .await
            .map_err(|source| DownloadError::Io {
                url: url.to_string(),
                path: path.to_path_buf(),
                source,
            })?;

        Ok(body.len())
    }
}

/// Host and port: requests are paced per server, as in the URL's authority.
fn pacing_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial download"),
    }
}
