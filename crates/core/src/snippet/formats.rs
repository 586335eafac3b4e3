//! Registries of query formats and title variants.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::show::{EpisodeRef, Season, SnippetKind};

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^ a-zA-Z0-9]").expect("static regex is valid"));

/// How a season or episode is written in a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFormat {
    /// `{title} season {N}`
    SeasonNumber,
    /// `{title} S{SS}E{EE}`
    EpisodeCode,
    /// `{title} {S}x{E}`
    EpisodeCross,
    /// `{title} {YYYY} {MM} {DD}`, for shows that air daily.
    EpisodeAirDate,
}

const SEASON_FORMATS: &[QueryFormat] = &[QueryFormat::SeasonNumber];

const EPISODE_FORMATS: &[QueryFormat] = &[
    QueryFormat::EpisodeCode,
    QueryFormat::EpisodeCross,
    QueryFormat::EpisodeAirDate,
];

/// The season or episode a query is rendered for.
#[derive(Debug, Clone, Copy)]
pub enum QueryTarget<'a> {
    Season(&'a Season),
    Episode(EpisodeRef<'a>),
}

impl QueryFormat {
    /// Registered formats for a snippet kind, in enumeration order.
    pub fn for_kind(kind: SnippetKind) -> &'static [QueryFormat] {
        match kind {
            SnippetKind::Season => SEASON_FORMATS,
            SnippetKind::Episode => EPISODE_FORMATS,
        }
    }

    /// Stable key stored as the format part of a snippet.
    pub fn key(&self) -> &'static str {
        match self {
            QueryFormat::SeasonNumber => "{title} season {N}",
            QueryFormat::EpisodeCode => "{title} S{SS}E{EE}",
            QueryFormat::EpisodeCross => "{title} {S}x{E}",
            QueryFormat::EpisodeAirDate => "{title} {YYYY} {MM} {DD}",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [
            QueryFormat::SeasonNumber,
            QueryFormat::EpisodeCode,
            QueryFormat::EpisodeCross,
            QueryFormat::EpisodeAirDate,
        ]
        .into_iter()
        .find(|f| f.key() == key)
    }

    pub fn is_date_based(&self) -> bool {
        matches!(self, QueryFormat::EpisodeAirDate)
    }

    /// Render a query string.
    ///
    /// Returns `None` when the format does not apply to the target (a season
    /// format for an episode or vice versa) or when the episode has no air
    /// date for a date-based format.
    pub fn render(&self, title: &str, target: QueryTarget<'_>) -> Option<String> {
        match (self, target) {
            (QueryFormat::SeasonNumber, QueryTarget::Season(season)) => {
                Some(format!("{} season {}", title, season.season))
            }
            (QueryFormat::EpisodeCode, QueryTarget::Episode(e)) => Some(format!(
                "{} S{:02}E{:02}",
                title, e.season, e.episode.episode
            )),
            (QueryFormat::EpisodeCross, QueryTarget::Episode(e)) => {
                Some(format!("{} {}x{}", title, e.season, e.episode.episode))
            }
            (QueryFormat::EpisodeAirDate, QueryTarget::Episode(e)) => e
                .episode
                .air_date
                .map(|d| format!("{} {}", title, d.format("%Y %m %d"))),
            _ => None,
        }
    }
}

/// Ways to rewrite a show title before it goes into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleVariant {
    Original,
    /// Drops everything except ASCII letters, digits and spaces.
    Alphanumeric,
    /// Keeps the first N space-separated words.
    FirstWords(usize),
}

/// Registered title variants, in enumeration order.
pub const TITLE_VARIANTS: &[TitleVariant] = &[
    TitleVariant::Original,
    TitleVariant::Alphanumeric,
    TitleVariant::FirstWords(5),
    TitleVariant::FirstWords(4),
    TitleVariant::FirstWords(3),
];

impl TitleVariant {
    pub fn apply(&self, title: &str) -> String {
        match self {
            TitleVariant::Original => title.to_string(),
            TitleVariant::Alphanumeric => NON_ALPHANUMERIC.replace_all(title, "").into_owned(),
            TitleVariant::FirstWords(n) => truncate_to_words(title, *n),
        }
    }
}

fn truncate_to_words(title: &str, n: usize) -> String {
    let parts: Vec<&str> = title.split(' ').collect();
    if parts.len() < n {
        return title.to_string();
    }
    parts[..n].join(" ")
}
