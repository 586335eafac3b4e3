//! Pass-level entry points.
//!
//! An [`Acquirer`] wires the query builder, the search dispatcher and the
//! download manager together. One pass over a show builds query jobs for
//! everything pending, searches them with bounded concurrency, feeds the
//! winners back into the snippet history and downloads them.

use std::path::Path;

use futures::stream::{self, StreamExt};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::download::{DownloadError, DownloadManager, DownloadReport};
use crate::query::{QueryJob, QueryJobBuilder};
use crate::searcher::{Dispatch, Dispatcher, EngineRegistry, SearchError, Torrent};
use crate::show::Show;
use crate::snippet::{record_result, SnippetSelector};

/// Errors building an [`Acquirer`] from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Winners of a search pass.
///
/// `last_error` is the last search failure of a job that found nothing; it
/// does not mean that the whole pass found nothing.
#[derive(Debug, Default)]
pub struct FoundTorrents {
    pub torrents: Vec<Torrent>,
    /// Jobs searched in this pass.
    pub jobs: usize,
    pub last_error: Option<SearchError>,
}

/// Outcome of [`Acquirer::acquire`].
#[derive(Debug, Default)]
pub struct PassReport {
    pub found: FoundTorrents,
    pub downloads: DownloadReport,
}

pub struct Acquirer {
    builder: QueryJobBuilder,
    dispatcher: Dispatcher,
    downloads: DownloadManager,
    max_concurrent_jobs: usize,
}

impl Acquirer {
    pub fn new(
        builder: QueryJobBuilder,
        dispatcher: Dispatcher,
        downloads: DownloadManager,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            builder,
            dispatcher,
            downloads,
            max_concurrent_jobs: max_concurrent_jobs.max(1),
        }
    }

    /// Build every component from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let registry = EngineRegistry::from_config(&config.engines, config.search.timeout())?;
        let builder = QueryJobBuilder::new(
            SnippetSelector::new(config.search.explore_probability),
            config.search.batch_size,
        );
        let dispatcher = Dispatcher::new(registry, config.search.timeout());
        let downloads = DownloadManager::new(config.download.options())?;

        Ok(Self::new(
            builder,
            dispatcher,
            downloads,
            config.search.max_concurrent_jobs,
        ))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Query jobs for everything pending on `show`.
    pub fn plan<R: Rng>(&self, show: &Show, rng: &mut R) -> Vec<QueryJob> {
        self.builder.build(show, rng)
    }

    /// Search for everything pending on `show`, recording winners in its
    /// snippet history.
    pub async fn find_torrents(&self, show: &mut Show) -> FoundTorrents {
        let jobs = self.plan(show, &mut rand::rng());
        self.search_jobs(show, &jobs).await
    }

    /// Run `jobs` through the dispatcher, at most `max_concurrent_jobs` at a
    /// time. Feedback is applied afterwards in job order.
    pub async fn search_jobs(&self, show: &mut Show, jobs: &[QueryJob]) -> FoundTorrents {
        info!(show = %show.title, jobs = jobs.len(), "Searching torrents");

        let results: Vec<Dispatch> = stream::iter(jobs)
            .map(|job| self.dispatcher.execute(job))
            .buffered(self.max_concurrent_jobs)
            .collect()
            .await;

        let mut found = FoundTorrents {
            jobs: jobs.len(),
            ..FoundTorrents::default()
        };
        for (job, dispatch) in jobs.iter().zip(results) {
            match dispatch.winner {
                Some(torrent) => {
                    record_result(show, job.kind(), &job.snippet, torrent.seeders);
                    found.torrents.push(torrent);
                }
                None => {
                    debug!(query = %job.query, "Nothing found");
                    if dispatch.last_error.is_some() {
                        found.last_error = dispatch.last_error;
                    }
                }
            }
        }

        info!(
            show = %show.title,
            found = found.torrents.len(),
            "Search pass complete"
        );
        found
    }

    /// Download `torrents` into `destination`, marking acquired media done.
    pub async fn download(
        &self,
        show: &mut Show,
        torrents: &[Torrent],
        destination: &Path,
    ) -> DownloadReport {
        self.downloads.download(show, torrents, destination).await
    }

    /// Search then download everything pending on `show`.
    pub async fn acquire(&self, show: &mut Show, destination: &Path) -> PassReport {
        let found = self.find_torrents(show).await;
        let downloads = self.download(show, &found.torrents, destination).await;
        PassReport { found, downloads }
    }
}
