//! Download manager against a local HTTP server: pacing, timeouts and
//! validation.

mod common;

use std::time::Duration;

use tempfile::TempDir;

use common::{fixtures, TestServer};
use getme_core::download::{DownloadError, DownloadManager, DownloadOptions};
use getme_core::{MediaRef, Show, Torrent};

fn manager(timeout: Duration, request_interval: Duration) -> DownloadManager {
    DownloadManager::new(DownloadOptions {
        timeout,
        request_interval,
        user_agent: "getme-test".to_string(),
    })
    .unwrap()
}

fn torrent(url: String, filename: &str, season: u32, episode: u32) -> Torrent {
    Torrent {
        url,
        filename: filename.to_string(),
        title: filename.trim_end_matches(".torrent").to_string(),
        seeders: 10,
        media: MediaRef::Episode { season, episode },
    }
}

fn show() -> Show {
    fixtures::show_with_seasons("Show", &[(1, 4)])
}

fn is_pending(show: &Show, episode: u32) -> bool {
    show.season(1).unwrap().episodes[episode as usize - 1].pending
}

fn entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_successful_download_marks_done() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let torrents = vec![torrent(server.url("/torrents/e1"), "e1.torrent", 1, 1)];

    let report = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert!(report.is_complete());
    assert!(report.last_error.is_none());
    assert_eq!(report.completed, torrents);
    assert!(!is_pending(&show, 1));
    assert!(is_pending(&show, 2));

    let written = std::fs::read(dir.path().join("e1.torrent")).unwrap();
    assert_eq!(written, fixtures::torrent_bytes("e1"));
}

#[tokio::test]
async fn test_same_host_requests_are_paced() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let interval = Duration::from_millis(400);
    let torrents = vec![
        torrent(server.url("/torrents/e1"), "e1.torrent", 1, 1),
        torrent(server.url("/torrents/e2"), "e2.torrent", 1, 2),
        torrent(server.url("/torrents/e3"), "e3.torrent", 1, 3),
    ];

    let report = manager(Duration::from_secs(2), interval)
        .download(&mut show, &torrents, dir.path())
        .await;
    assert_eq!(report.completed.len(), 3);

    let mut arrivals: Vec<_> = server.requests().into_iter().map(|(_, at)| at).collect();
    arrivals.sort();
    assert_eq!(arrivals.len(), 3);
    for pair in arrivals.windows(2) {
        // Small allowance for differing network latency of the two requests.
        assert!(pair[1] - pair[0] >= interval - Duration::from_millis(50));
    }
}

#[tokio::test]
async fn test_different_hosts_run_concurrently() {
    let first = TestServer::start().await;
    let second = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let torrents = vec![
        torrent(first.url("/torrents/e1"), "e1.torrent", 1, 1),
        torrent(second.url("/torrents/e2"), "e2.torrent", 1, 2),
    ];

    let started = std::time::Instant::now();
    let report = manager(Duration::from_secs(2), Duration::from_secs(10))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert_eq!(report.completed.len(), 2);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_timeout_fails_only_that_torrent() {
    let server = TestServer::start().await;
    let other = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let torrents = vec![
        torrent(server.url("/slow/e1"), "e1.torrent", 1, 1),
        torrent(other.url("/torrents/e2"), "e2.torrent", 1, 2),
    ];

    let report = manager(Duration::from_millis(200), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.last_error,
        Some(DownloadError::Timeout { ref url, .. }) if url.ends_with("/slow/e1")
    ));
    // The error is a signal only: the other torrent still made it.
    assert_eq!(report.completed.len(), 1);
    assert!(!is_pending(&show, 2));

    assert!(is_pending(&show, 1));
    assert_eq!(entries(dir.path()), vec!["e2.torrent"]);
}

#[tokio::test]
async fn test_failure_after_file_creation_removes_partial_file() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    // A directory in the way makes the final rename fail after the body was
    // written.
    std::fs::create_dir(dir.path().join("e1.torrent")).unwrap();
    let torrents = vec![torrent(server.url("/torrents/e1"), "e1.torrent", 1, 1)];

    let report = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert_eq!(server.requests().len(), 1);
    assert!(matches!(
        report.last_error,
        Some(DownloadError::Io { ref path, .. }) if path.ends_with("e1.torrent")
    ));
    assert!(report.completed.is_empty());
    assert!(is_pending(&show, 1));
    assert_eq!(entries(dir.path()), vec!["e1.torrent"]);
    assert!(dir.path().join("e1.torrent").is_dir());
}

#[tokio::test]
async fn test_failed_duplicate_keeps_stored_file() {
    let server = TestServer::start().await;
    let other = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let torrents = vec![
        torrent(server.url("/torrents/e1"), "same.torrent", 1, 1),
        torrent(other.url("/garbage/e2"), "same.torrent", 1, 2),
    ];

    let report = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.failed, 1);
    assert!(!is_pending(&show, 1));
    assert!(is_pending(&show, 2));
    assert_eq!(entries(dir.path()), vec!["same.torrent"]);
    assert_eq!(
        std::fs::read(dir.path().join("same.torrent")).unwrap(),
        fixtures::torrent_bytes("e1")
    );
}

#[tokio::test]
async fn test_duplicate_filenames_both_succeed() {
    let server = TestServer::start().await;
    let other = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let torrents = vec![
        torrent(server.url("/torrents/e1"), "same.torrent", 1, 1),
        torrent(other.url("/torrents/e2"), "same.torrent", 1, 2),
    ];

    let report = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert!(report.is_complete());
    assert_eq!(entries(dir.path()), vec!["same.torrent"]);
}

#[tokio::test]
async fn test_invalid_payload_is_not_stored() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = show();
    let torrents = vec![torrent(server.url("/garbage/e1"), "e1.torrent", 1, 1)];

    let report = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert!(matches!(
        report.last_error,
        Some(DownloadError::InvalidTorrent { .. })
    ));
    assert!(is_pending(&show, 1));
    assert!(entries(dir.path()).is_empty());
}

#[tokio::test]
async fn test_http_error_status() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let torrents = vec![torrent(server.url("/missing/e1"), "e1.torrent", 1, 1)];

    let outcomes = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download_all(&torrents, dir.path())
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0].result,
        Err(DownloadError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_season_torrent_marks_whole_season() {
    let server = TestServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut show = fixtures::show_with_seasons("Show", &[(1, 3), (2, 1)]);
    let torrents = vec![Torrent {
        url: server.url("/torrents/s1"),
        filename: "s1.torrent".to_string(),
        title: "Show season 1".to_string(),
        seeders: 5,
        media: MediaRef::Season { season: 1 },
    }];

    let report = manager(Duration::from_secs(2), Duration::from_millis(50))
        .download(&mut show, &torrents, dir.path())
        .await;

    assert!(report.is_complete());
    assert!(show.pending_seasons().is_empty());
    assert!(show.season(1).unwrap().episodes.iter().all(|e| !e.pending));
}
