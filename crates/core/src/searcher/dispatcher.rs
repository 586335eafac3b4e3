//! Scatter-gather search across every registered engine.

use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::metrics::{
    DISPATCH_TIMEOUTS, ENGINE_DURATION, ENGINE_REQUESTS, SEARCH_RESULTS, WINNERS_FOUND,
};
use crate::query::QueryJob;
use crate::show::{Show, SnippetKind};
use crate::snippet::record_result;

use super::filter::filter_candidates;
use super::{EngineRegistry, SearchError, Torrent, TorrentCandidate};

/// How long to wait for engines before ranking what has arrived.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of one dispatched job.
///
/// An empty `winner` is an expected outcome. `last_error` is the last engine
/// failure or deadline hit for this job and is only a signal: the job itself
/// never fails.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub winner: Option<Torrent>,
    pub last_error: Option<SearchError>,
}

/// Fans a query out to every engine and picks the best-seeded result.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: EngineRegistry,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: EngineRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Search every engine for `job` and return the winner.
    ///
    /// Engines still running at the deadline are dropped, which aborts their
    /// requests. A failing engine only contributes no results; its error is
    /// kept in [`Dispatch::last_error`].
    pub async fn execute(&self, job: &QueryJob) -> Dispatch {
        let engines = self.registry.engines();
        if engines.is_empty() {
            debug!(query = %job.query, "No search engines registered");
            return Dispatch::default();
        }

        let deadline = Instant::now() + self.timeout;
        let query = job.query.as_str();
        let season_filter = job.season_filter;

        let mut pending: FuturesUnordered<_> = engines
            .iter()
            .enumerate()
            .map(|(index, engine)| async move {
                let start = std::time::Instant::now();
                let result = engine
                    .search(query)
                    .await
                    .map(|candidates| (candidates.len(), filter_candidates(candidates, season_filter)));
                (index, start.elapsed(), result)
            })
            .collect();

        let mut reported = vec![false; engines.len()];
        let mut collected: Vec<(usize, Vec<TorrentCandidate>)> = Vec::with_capacity(engines.len());
        let mut last_error = None;

        loop {
            match timeout_at(deadline, pending.next()).await {
                Ok(Some((index, elapsed, result))) => {
                    reported[index] = true;
                    let name = engines[index].name();
                    ENGINE_DURATION
                        .with_label_values(&[name])
                        .observe(elapsed.as_secs_f64());

                    match result {
                        Ok((total, kept)) => {
                            ENGINE_REQUESTS.with_label_values(&[name, "success"]).inc();
                            debug!(
                                engine = name,
                                query,
                                results = total,
                                kept = kept.len(),
                                "Engine search complete"
                            );
                            collected.push((index, kept));
                        }
                        Err(e) => {
                            ENGINE_REQUESTS.with_label_values(&[name, "error"]).inc();
                            warn!(engine = name, query, error = %e, "Search engine failed");
                            last_error = Some(e);
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    let outstanding = pending.len();
                    for (engine, _) in engines.iter().zip(&reported).filter(|(_, r)| !**r) {
                        ENGINE_REQUESTS
                            .with_label_values(&[engine.name(), "abandoned"])
                            .inc();
                    }
                    DISPATCH_TIMEOUTS.inc();
                    warn!(
                        query,
                        outstanding,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Search deadline reached, abandoning engines"
                    );
                    last_error = Some(SearchError::DispatchTimeout { outstanding });
                    break;
                }
            }
        }
        drop(pending);

        // Registration order, then each engine's own order, for equal seeds.
        collected.sort_by_key(|(index, _)| *index);
        let mut merged: Vec<TorrentCandidate> =
            collected.into_iter().flat_map(|(_, c)| c).collect();
        SEARCH_RESULTS
            .with_label_values(&[])
            .observe(merged.len() as f64);
        merged.sort_by(|a, b| b.seeders.cmp(&a.seeders));

        let winner = match merged.into_iter().next() {
            Some(best) => {
                let kind = match job.kind() {
                    SnippetKind::Season => "season",
                    SnippetKind::Episode => "episode",
                };
                WINNERS_FOUND.with_label_values(&[kind]).inc();
                info!(
                    query,
                    torrent = %best.title,
                    seeders = best.seeders,
                    media = %job.media,
                    "Found torrent"
                );
                Some(Torrent::from_candidate(best, job.media))
            }
            None => {
                debug!(query, failed = last_error.is_some(), "No torrents found");
                None
            }
        };

        Dispatch { winner, last_error }
    }

    /// [`Dispatcher::execute`], then feed the winner's seed count back into
    /// the snippet history of `show`.
    pub async fn execute_and_record(&self, job: &QueryJob, show: &mut Show) -> Dispatch {
        let dispatch = self.execute(job).await;
        if let Some(torrent) = &dispatch.winner {
            record_result(show, job.kind(), &job.snippet, torrent.seeders);
        }
        dispatch
    }
}
