//! Types for tracked shows.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked TV show together with everything needed to acquire it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    /// Display title, also used as the base of every search query.
    pub title: String,
    /// Identifier of the show at its metadata source.
    pub id: u64,
    /// Name of the metadata source the show was found on.
    pub source_name: String,
    /// Whether the show airs (nearly) daily. See [`Show::update_is_daily`].
    #[serde(default)]
    pub is_daily: bool,
    /// Seasons in discovery order. Not necessarily sorted by number.
    #[serde(default)]
    pub seasons: Vec<Season>,
    /// Score histories for the query snippets tried so far.
    #[serde(default)]
    pub query_snippets: QuerySnippets,
}

/// Snippet histories, kept separately for season and episode queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySnippets {
    #[serde(default)]
    pub for_season: Vec<Snippet>,
    #[serde(default)]
    pub for_episode: Vec<Snippet>,
}

/// A (title variant, query format) pair and the best seed count it produced.
///
/// The pair is the identity of a snippet. Recording a new result for the same
/// pair replaces the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title_snippet: String,
    pub format_snippet: String,
    #[serde(default)]
    pub score: u32,
}

impl Snippet {
    pub fn new(title_snippet: impl Into<String>, format_snippet: impl Into<String>) -> Self {
        Self {
            title_snippet: title_snippet.into(),
            format_snippet: format_snippet.into(),
            score: 0,
        }
    }

    /// True if both snippets describe the same (title, format) pair.
    pub fn same_pair(&self, other: &Snippet) -> bool {
        self.title_snippet == other.title_snippet && self.format_snippet == other.format_snippet
    }
}

/// Which snippet history a query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetKind {
    Season,
    Episode,
}

/// A season of a show. Owned by exactly one [`Show`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub season: u32,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// An episode of a season. Owned by exactly one [`Season`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub episode: u32,
    #[serde(default)]
    pub title: String,
    /// `None` when the metadata source did not know the air date.
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
    /// Cleared only by a successful download.
    #[serde(default = "default_pending")]
    pub pending: bool,
}

fn default_pending() -> bool {
    true
}

/// Reference to the season or episode a torrent was found for.
///
/// Carried by every query job and torrent so a successful download can mark
/// the right item as acquired via [`Show::mark_done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaRef {
    Season { season: u32 },
    Episode { season: u32, episode: u32 },
}

impl MediaRef {
    pub fn kind(&self) -> SnippetKind {
        match self {
            MediaRef::Season { .. } => SnippetKind::Season,
            MediaRef::Episode { .. } => SnippetKind::Episode,
        }
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Season { season } => write!(f, "season {}", season),
            MediaRef::Episode { season, episode } => write!(f, "S{:02}E{:02}", season, episode),
        }
    }
}

/// A borrowed episode together with the number of the season it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeRef<'a> {
    pub season: u32,
    pub episode: &'a Episode,
}

impl EpisodeRef<'_> {
    pub fn media(&self) -> MediaRef {
        MediaRef::Episode {
            season: self.season,
            episode: self.episode.episode,
        }
    }
}

impl Show {
    /// Create a show without any seasons.
    pub fn new(source_name: impl Into<String>, id: u64, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id,
            source_name: source_name.into(),
            is_daily: false,
            seasons: Vec::new(),
            query_snippets: QuerySnippets::default(),
        }
    }

    /// All episodes of all seasons, in storage order.
    pub fn episodes(&self) -> impl Iterator<Item = EpisodeRef<'_>> {
        self.seasons.iter().flat_map(|season| {
            season.episodes.iter().map(move |episode| EpisodeRef {
                season: season.season,
                episode,
            })
        })
    }

    /// First season with the given number.
    pub fn season(&self, number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.season == number)
    }

    /// Mark the referenced season or episode as acquired.
    ///
    /// Returns false when nothing in the show matches the reference.
    pub fn mark_done(&mut self, media: &MediaRef) -> bool {
        match *media {
            MediaRef::Season { season } => {
                let mut found = false;
                for s in self.seasons.iter_mut().filter(|s| s.season == season) {
                    s.mark_done();
                    found = true;
                }
                found
            }
            MediaRef::Episode { season, episode } => {
                let mut found = false;
                for e in self
                    .seasons
                    .iter_mut()
                    .filter(|s| s.season == season)
                    .flat_map(|s| s.episodes.iter_mut())
                    .filter(|e| e.episode == episode)
                {
                    e.mark_done();
                    found = true;
                }
                found
            }
        }
    }

    /// Snippet history for the given kind.
    pub fn snippets(&self, kind: SnippetKind) -> &[Snippet] {
        match kind {
            SnippetKind::Season => &self.query_snippets.for_season,
            SnippetKind::Episode => &self.query_snippets.for_episode,
        }
    }

    pub fn snippets_mut(&mut self, kind: SnippetKind) -> &mut Vec<Snippet> {
        match kind {
            SnippetKind::Season => &mut self.query_snippets.for_season,
            SnippetKind::Episode => &mut self.query_snippets.for_episode,
        }
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Show: {}, number of seasons: {}, number of episodes: {}",
            self.title,
            self.seasons.len(),
            self.episodes().count()
        )
    }
}

impl Season {
    pub fn new(season: u32, episodes: Vec<Episode>) -> Self {
        Self { season, episodes }
    }

    pub fn media(&self) -> MediaRef {
        MediaRef::Season {
            season: self.season,
        }
    }

    /// Episodes of this season that still need to be acquired.
    pub fn pending_episodes(&self) -> impl Iterator<Item = EpisodeRef<'_>> {
        self.episodes
            .iter()
            .filter(|e| e.pending)
            .map(move |episode| EpisodeRef {
                season: self.season,
                episode,
            })
    }

    /// True when no episode of this season has been acquired yet.
    pub fn all_episodes_pending(&self) -> bool {
        self.episodes.iter().all(|e| e.pending)
    }

    /// Mark every episode of the season as acquired.
    pub fn mark_done(&mut self) {
        for episode in &mut self.episodes {
            episode.mark_done();
        }
    }
}

impl Episode {
    /// Create a pending episode.
    pub fn new(episode: u32, title: impl Into<String>, air_date: Option<NaiveDate>) -> Self {
        Self {
            episode,
            title: title.into(),
            air_date,
            pending: true,
        }
    }

    pub fn mark_done(&mut self) {
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show_with_two_seasons() -> Show {
        let mut show = Show::new("tvmaze", 1, "Some Show");
        show.seasons.push(Season::new(
            1,
            vec![Episode::new(1, "Pilot", None), Episode::new(2, "Second", None)],
        ));
        show.seasons
            .push(Season::new(2, vec![Episode::new(1, "Return", None)]));
        show
    }

    #[test]
    fn test_episodes_lists_all_seasons() {
        let show = show_with_two_seasons();
        let episodes: Vec<_> = show.episodes().map(|e| e.media()).collect();
        assert_eq!(
            episodes,
            vec![
                MediaRef::Episode { season: 1, episode: 1 },
                MediaRef::Episode { season: 1, episode: 2 },
                MediaRef::Episode { season: 2, episode: 1 },
            ]
        );
    }

    #[test]
    fn test_mark_done_episode() {
        let mut show = show_with_two_seasons();
        assert!(show.mark_done(&MediaRef::Episode { season: 1, episode: 2 }));

        let season = show.season(1).unwrap();
        assert!(season.episodes[0].pending);
        assert!(!season.episodes[1].pending);
        assert!(show.season(2).unwrap().episodes[0].pending);
    }

    #[test]
    fn test_mark_done_season() {
        let mut show = show_with_two_seasons();
        assert!(show.mark_done(&MediaRef::Season { season: 1 }));

        assert!(show.season(1).unwrap().episodes.iter().all(|e| !e.pending));
        assert!(show.season(2).unwrap().all_episodes_pending());
    }

    #[test]
    fn test_mark_done_unknown_media() {
        let mut show = show_with_two_seasons();
        assert!(!show.mark_done(&MediaRef::Season { season: 9 }));
        assert!(!show.mark_done(&MediaRef::Episode { season: 1, episode: 9 }));
        assert_eq!(show, show_with_two_seasons());
    }

    #[test]
    fn test_media_ref_display() {
        assert_eq!(MediaRef::Season { season: 3 }.to_string(), "season 3");
        assert_eq!(
            MediaRef::Episode { season: 3, episode: 7 }.to_string(),
            "S03E07"
        );
    }

    #[test]
    fn test_show_deserializes_with_defaults() {
        let json = r#"{
            "title": "Minimal",
            "id": 42,
            "source_name": "trakt",
            "seasons": [{"season": 1, "episodes": [{"episode": 1}]}]
        }"#;
        let show: Show = serde_json::from_str(json).unwrap();

        assert!(!show.is_daily);
        assert!(show.query_snippets.for_episode.is_empty());
        let episode = &show.seasons[0].episodes[0];
        assert!(episode.pending);
        assert!(episode.air_date.is_none());
    }

    #[test]
    fn test_media_ref_serialization() {
        let json = serde_json::to_string(&MediaRef::Episode { season: 1, episode: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"episode","season":1,"episode":2}"#);
    }
}
