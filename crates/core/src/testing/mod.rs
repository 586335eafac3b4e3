//! Testing utilities and mock implementations.
//!
//! Provides a mock [`SearchEngine`](crate::searcher::SearchEngine) and
//! fixtures so a full acquisition pass can run without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use getme_core::testing::{fixtures, MockSearchEngine};
//!
//! let engine = MockSearchEngine::new("mock");
//! engine.set_results(vec![fixtures::candidate("Show S01E01", 10)]).await;
//!
//! let show = fixtures::show_with_seasons("Show", &[(1, 10), (2, 3)]);
//! ```

mod mock_search_engine;

pub use mock_search_engine::{MockSearchEngine, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::searcher::TorrentCandidate;
    use crate::show::{Episode, Season, Show};

    /// A candidate served from a fake host.
    pub fn candidate(title: &str, seeders: u32) -> TorrentCandidate {
        TorrentCandidate::new(
            title,
            format!(
                "http://torrents.example/{}.torrent",
                title.replace(' ', "_")
            ),
            seeders,
        )
    }

    /// A season whose episodes air weekly starting on the first of January
    /// of `2000 + season`. Every episode is pending.
    pub fn season(number: u32, episodes: u32) -> Season {
        let start = NaiveDate::from_ymd_opt(2000 + number as i32, 1, 1)
            .unwrap_or_default();
        Season::new(
            number,
            (1..=episodes)
                .map(|e| {
                    Episode::new(
                        e,
                        format!("Episode {}", e),
                        Some(start + chrono::Days::new(7 * (e as u64 - 1))),
                    )
                })
                .collect(),
        )
    }

    /// A season whose episodes air on consecutive days.
    pub fn daily_season(number: u32, episodes: u32) -> Season {
        let mut season = season(number, episodes);
        let start = NaiveDate::from_ymd_opt(2000 + number as i32, 1, 1)
            .unwrap_or_default();
        for (i, episode) in season.episodes.iter_mut().enumerate() {
            episode.air_date = Some(start + chrono::Days::new(i as u64));
        }
        season
    }

    /// A show built from `(season number, episode count)` pairs.
    pub fn show_with_seasons(title: &str, seasons: &[(u32, u32)]) -> Show {
        let mut show = Show::new("tvmaze", 1, title);
        show.seasons = seasons.iter().map(|(n, e)| season(*n, *e)).collect();
        show
    }

    /// A minimal but well-formed single-file bencoded torrent.
    pub fn torrent_bytes(name: &str) -> Vec<u8> {
        fn bstr(out: &mut Vec<u8>, value: &[u8]) {
            out.extend_from_slice(value.len().to_string().as_bytes());
            out.push(b':');
            out.extend_from_slice(value);
        }

        let mut out = Vec::new();
        out.push(b'd');
        bstr(&mut out, b"announce");
        bstr(&mut out, b"http://tracker.example/announce");
        bstr(&mut out, b"info");
        out.push(b'd');
        bstr(&mut out, b"length");
        out.extend_from_slice(b"i1024e");
        bstr(&mut out, b"name");
        bstr(&mut out, name.as_bytes());
        bstr(&mut out, b"piece length");
        out.extend_from_slice(b"i16384e");
        bstr(&mut out, b"pieces");
        bstr(&mut out, &[0xab; 20]);
        out.extend_from_slice(b"ee");
        out
    }
}
