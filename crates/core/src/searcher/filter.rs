//! Result filters applied to every engine's results before ranking.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::TorrentCandidate;

/// Blocked anywhere in a title, case-insensitive.
const FOREIGN_MARKERS: &[&str] = &["french", "spanish", "español", "vostfr"];

/// Blocked only as whole words, case-insensitive.
const FOREIGN_WORDS: &[&str] = &["ita", "hc"];

static SEASON_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bseasons?\s*(\d+(?:\s*(?:-|,|&|and)\s*\d+)*)").unwrap()
});

static SEASON_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(?:\s*-\s*(\d+))?").unwrap());

/// False for titles that look like non-English releases.
pub fn is_english(title: &str) -> bool {
    let lower = title.to_lowercase();
    if FOREIGN_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }
    !lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| FOREIGN_WORDS.contains(&word))
}

/// Whether the title mentions `season`, alone or inside a list or range
/// such as `seasons 1,2,3` or `season 1-6`.
pub fn matches_season(title: &str, season: u32) -> bool {
    SEASON_MENTION.captures_iter(title).any(|caps| {
        SEASON_ITEM.captures_iter(&caps[1]).any(|item| {
            let Some(first) = item.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
                return false;
            };
            match item.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
                Some(last) => (first.min(last)..=first.max(last)).contains(&season),
                None => first == season,
            }
        })
    })
}

/// Drop foreign releases and, when `season_filter` is not 0, results that do
/// not mention that season. Order is preserved.
pub fn filter_candidates(
    candidates: Vec<TorrentCandidate>,
    season_filter: u32,
) -> Vec<TorrentCandidate> {
    candidates
        .into_iter()
        .filter(|c| is_english(&c.title))
        .filter(|c| season_filter == 0 || matches_season(&c.title, season_filter))
        .collect()
}
