//! Local HTTP server standing in for torrent hosts and search engines.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;

pub use getme_core::testing::fixtures;

/// API key the fake Jackett accepts.
pub const JACKETT_API_KEY: &str = "test-key";

/// How long `/slow/...` takes to answer.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(3);

#[derive(Clone)]
struct ServerState {
    base_url: String,
    requests: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl ServerState {
    fn record(&self, path: String) {
        self.requests
            .lock()
            .unwrap()
            .push((path, Instant::now()));
    }
}

/// A server on 127.0.0.1 with a random port.
///
/// Routes:
/// - `/torrents/{name}`: a valid torrent
/// - `/slow/{name}`: a valid torrent after [`SLOW_RESPONSE`]
/// - `/garbage/{name}`: an HTML page
/// - `/api/v2.0/indexers/all/results`: Jackett search
/// - `/tp/`: TorrentProject search
pub struct TestServer {
    pub addr: SocketAddr,
    state: ServerState,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServerState {
            base_url: format!("http://{}", addr),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let router = Router::new()
            .route("/torrents/{name}", get(torrent))
            .route("/slow/{name}", get(slow_torrent))
            .route("/garbage/{name}", get(garbage))
            .route("/api/v2.0/indexers/all/results", get(jackett_search))
            .route("/tp/", get(torrent_project_search))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.state.base_url, path)
    }

    /// Paths requested so far, with arrival times.
    pub fn requests(&self) -> Vec<(String, Instant)> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn torrent(State(state): State<ServerState>, Path(name): Path<String>) -> Vec<u8> {
    state.record(format!("/torrents/{}", name));
    fixtures::torrent_bytes(&name)
}

async fn slow_torrent(State(state): State<ServerState>, Path(name): Path<String>) -> Vec<u8> {
    state.record(format!("/slow/{}", name));
    tokio::time::sleep(SLOW_RESPONSE).await;
    fixtures::torrent_bytes(&name)
}

async fn garbage(State(state): State<ServerState>, Path(name): Path<String>) -> &'static str {
    state.record(format!("/garbage/{}", name));
    "<html><body>Too many requests</body></html>"
}

async fn jackett_search(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/api/v2.0/indexers/all/results".to_string());
    if params.get("apikey").map(String::as_str) != Some(JACKETT_API_KEY) {
        return (StatusCode::UNAUTHORIZED, "bad api key").into_response();
    }
    let query = params.get("Query").cloned().unwrap_or_default();

    Json(json!({
        "Results": [
            {
                "Title": format!("{} 720p", query),
                "Link": format!("{}/torrents/jackett-1", state.base_url),
                "Seeders": 14,
                "Peers": 20
            },
            {
                "Title": format!("{} magnet only", query),
                "Link": null,
                "MagnetUri": "magnet:?xt=urn:btih:0123",
                "Seeders": 400
            }
        ],
        "Indexers": []
    }))
    .into_response()
}

async fn torrent_project_search(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record("/tp/".to_string());
    if params.get("out").map(String::as_str) != Some("json") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let query = params.get("s").cloned().unwrap_or_default();

    Json(json!({
        "total_found": "2",
        "1": { "title": format!("{} 1080p", query), "seeds": 30, "torrent_hash": "aaaa" },
        "2": { "title": format!("{} 480p", query), "seeds": 2, "torrent_hash": "bbbb" }
    }))
    .into_response()
}
