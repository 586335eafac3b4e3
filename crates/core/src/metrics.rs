//! Prometheus metrics for the acquisition pass.
//!
//! This module provides metrics for:
//! - Query construction (jobs built, explore/exploit draws)
//! - Search dispatch (engine requests, timeouts, winners)
//! - Downloads (results, durations, per-host pacing)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Query Metrics
// =============================================================================

/// Query jobs built, by media kind.
pub static QUERY_JOBS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("getme_query_jobs_total", "Total query jobs built"),
        &["kind"], // "season", "episode"
    )
    .unwrap()
});

/// Snippet selections, by draw.
pub static SNIPPET_DRAWS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("getme_snippet_draws_total", "Total snippet selections"),
        &["draw"], // "explore", "exploit"
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Requests made to search engines.
pub static ENGINE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "getme_engine_requests_total",
            "Total search engine requests",
        ),
        &["engine", "status"], // status: "success", "error", "abandoned"
    )
    .unwrap()
});

/// Search engine request duration.
pub static ENGINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "getme_engine_duration_seconds",
            "Duration of search engine requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0]),
        &["engine"],
    )
    .unwrap()
});

/// Jobs whose collection hit the global search deadline.
pub static DISPATCH_TIMEOUTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "getme_dispatch_timeouts_total",
        "Total searches that hit the collection deadline",
    )
    .unwrap()
});

/// Filtered results collected per job.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "getme_search_results",
            "Number of filtered results collected per query job",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

/// Jobs that produced a winner, by media kind.
pub static WINNERS_FOUND: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("getme_winners_found_total", "Total query jobs with a winner"),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Downloads by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("getme_downloads_total", "Total torrent downloads"),
        &["result"], // "success", "failed", "timeout"
    )
    .unwrap()
});

/// Download duration in seconds, pacing excluded.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("getme_download_duration_seconds", "Duration of downloads")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]),
        &["result"],
    )
    .unwrap()
});

/// Time spent waiting on a host's pacing gate.
pub static PACING_WAIT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "getme_pacing_wait_seconds",
            "Time spent waiting for a per-host request slot",
        )
        .buckets(vec![0.0, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queries
        Box::new(QUERY_JOBS.clone()),
        Box::new(SNIPPET_DRAWS.clone()),
        // Search
        Box::new(ENGINE_REQUESTS.clone()),
        Box::new(ENGINE_DURATION.clone()),
        Box::new(DISPATCH_TIMEOUTS.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(WINNERS_FOUND.clone()),
        // Downloads
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(PACING_WAIT.clone()),
    ]
}
