//! Torrent search.
//!
//! Search engines implement [`SearchEngine`] and are collected in an
//! [`EngineRegistry`]. The [`Dispatcher`] queries every registered engine
//! concurrently for a [`QueryJob`](crate::query::QueryJob), filters the
//! results and returns the best-seeded one.

mod dispatcher;
mod filter;
mod jackett;
mod registry;
mod torrent_project;
mod types;

pub use dispatcher::{Dispatch, Dispatcher, DEFAULT_SEARCH_TIMEOUT};
pub use filter::{filter_candidates, is_english, matches_season};
pub use jackett::JackettEngine;
pub use registry::EngineRegistry;
pub use torrent_project::{TorrentProjectEngine, DEFAULT_CACHE_URL, DEFAULT_URL};
pub use types::*;
