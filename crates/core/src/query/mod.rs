//! Query job construction.
//!
//! Turns the pending items of a show into concrete search queries, each
//! tagged with the snippet that produced it and the media it is for.

use rand::Rng;
use tracing::debug;

use crate::metrics::{QUERY_JOBS, SNIPPET_DRAWS};
use crate::show::{EpisodeRef, MediaRef, Show, Snippet, SnippetKind};
use crate::snippet::{Draw, QueryFormat, QueryTarget, Selection, SnippetSelector};

/// Maximum number of episode queries per pass.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A single search to run against every engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJob {
    pub query: String,
    /// Snippet that produced `query`; receives the winner's score.
    pub snippet: Snippet,
    /// Item to mark as acquired once the winner is downloaded.
    pub media: MediaRef,
    /// Season number results must mention. 0 disables the filter.
    pub season_filter: u32,
}

impl QueryJob {
    pub fn kind(&self) -> SnippetKind {
        self.media.kind()
    }
}

/// Builds query jobs for a show's pending seasons and episodes.
#[derive(Debug, Clone)]
pub struct QueryJobBuilder {
    selector: SnippetSelector,
    batch_size: usize,
}

impl Default for QueryJobBuilder {
    fn default() -> Self {
        Self::new(SnippetSelector::default(), DEFAULT_BATCH_SIZE)
    }
}

impl QueryJobBuilder {
    pub fn new(selector: SnippetSelector, batch_size: usize) -> Self {
        Self {
            selector,
            batch_size,
        }
    }

    /// Season jobs first, then at most `batch_size` episode jobs for the most
    /// recently aired episodes.
    pub fn build<R: Rng>(&self, show: &Show, rng: &mut R) -> Vec<QueryJob> {
        let mut jobs = Vec::new();
        let mut episodes: Vec<EpisodeRef<'_>> = Vec::new();

        for season in show.pending_seasons() {
            // Specials are never bundled; look for them one by one.
            if season.season == 0 {
                episodes.extend(season.pending_episodes());
                continue;
            }

            let selection = self.select(show, SnippetKind::Season, rng);
            if let Some(job) = self.render(
                selection,
                SnippetKind::Season,
                QueryTarget::Season(season),
                season.media(),
                season.season,
            ) {
                jobs.push(job);
            }
        }

        episodes.extend(show.pending_episodes());
        // Most recent first; unknown air dates last.
        episodes.sort_by(|a, b| b.episode.air_date.cmp(&a.episode.air_date));
        episodes.truncate(self.batch_size);

        for episode in episodes {
            let selection = self.select(show, SnippetKind::Episode, rng);
            if let Some(job) = self.render(
                selection,
                SnippetKind::Episode,
                QueryTarget::Episode(episode),
                episode.media(),
                0,
            ) {
                jobs.push(job);
            }
        }

        debug!(show = %show.title, jobs = jobs.len(), "Built query jobs");
        jobs
    }

    fn select<R: Rng>(&self, show: &Show, kind: SnippetKind, rng: &mut R) -> Selection {
        let selection = self.selector.select(show, kind, rng);
        let draw = match selection.draw {
            Draw::Explore => "explore",
            Draw::Exploit => "exploit",
        };
        SNIPPET_DRAWS.with_label_values(&[draw]).inc();
        selection
    }

    /// Render the selected snippet, falling back to the first registered
    /// format that applies when the selected one cannot be rendered.
    fn render(
        &self,
        selection: Selection,
        kind: SnippetKind,
        target: QueryTarget<'_>,
        media: MediaRef,
        season_filter: u32,
    ) -> Option<QueryJob> {
        let candidates = std::iter::once(selection.format).chain(
            QueryFormat::for_kind(kind)
                .iter()
                .copied()
                .filter(|f| *f != selection.format),
        );

        for format in candidates {
            if let Some(query) = format.render(&selection.title, target) {
                let kind_label = match kind {
                    SnippetKind::Season => "season",
                    SnippetKind::Episode => "episode",
                };
                QUERY_JOBS.with_label_values(&[kind_label]).inc();
                return Some(QueryJob {
                    query,
                    snippet: Snippet::new(selection.title.clone(), format.key()),
                    media,
                    season_filter,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::show::{Episode, Season};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dated_season(number: u32, episodes: u32) -> Season {
        Season::new(
            number,
            (1..=episodes)
                .map(|e| {
                    Episode::new(
                        e,
                        format!("Episode {}", e),
                        NaiveDate::from_ymd_opt(2000 + number as i32, 1, e),
                    )
                })
                .collect(),
        )
    }

    fn exploit_only() -> QueryJobBuilder {
        QueryJobBuilder::new(SnippetSelector::new(0.0), DEFAULT_BATCH_SIZE)
    }

    fn scored(title: &str, format: QueryFormat, score: u32) -> Snippet {
        Snippet {
            score,
            ..Snippet::new(title, format.key())
        }
    }

    #[test]
    fn test_season_and_episode_jobs() {
        let mut show = Show::new("tvmaze", 1, "Show");
        show.seasons.push(dated_season(1, 2));
        show.seasons.push(dated_season(2, 2));
        show.query_snippets.for_season = vec![scored("Show", QueryFormat::SeasonNumber, 10)];
        show.query_snippets.for_episode = vec![scored("Show", QueryFormat::EpisodeCode, 10)];
        let mut rng = StdRng::seed_from_u64(1);

        let jobs = exploit_only().build(&show, &mut rng);

        let queries: Vec<&str> = jobs.iter().map(|j| j.query.as_str()).collect();
        assert_eq!(queries, vec!["Show season 1", "Show S02E02", "Show S02E01"]);
        assert_eq!(jobs[0].season_filter, 1);
        assert_eq!(jobs[0].media, MediaRef::Season { season: 1 });
        assert_eq!(jobs[1].season_filter, 0);
        assert_eq!(jobs[1].media, MediaRef::Episode { season: 2, episode: 2 });
        assert_eq!(jobs[1].snippet, Snippet::new("Show", QueryFormat::EpisodeCode.key()));
    }

    #[test]
    fn test_specials_are_not_bundled() {
        let mut show = Show::new("tvmaze", 1, "Show");
        show.seasons.push(dated_season(0, 2));
        show.seasons.push(dated_season(1, 1));
        let mut rng = StdRng::seed_from_u64(1);

        let jobs = exploit_only().build(&show, &mut rng);

        assert!(jobs.iter().all(|j| j.kind() == SnippetKind::Episode));
        assert!(jobs.contains_job(MediaRef::Episode { season: 0, episode: 1 }));
        assert!(jobs.contains_job(MediaRef::Episode { season: 0, episode: 2 }));
        assert!(jobs.contains_job(MediaRef::Episode { season: 1, episode: 1 }));
    }

    #[test]
    fn test_episode_batch_is_most_recent_first() {
        let mut show = Show::new("tvmaze", 1, "Show");
        show.is_daily = true;
        show.seasons.push(dated_season(1, 20));
        show.seasons.push(dated_season(2, 20));
        let builder = QueryJobBuilder::new(SnippetSelector::new(0.0), 5);
        let mut rng = StdRng::seed_from_u64(9);

        let jobs = builder.build(&show, &mut rng);

        let media: Vec<MediaRef> = jobs.iter().map(|j| j.media).collect();
        assert_eq!(
            media,
            (16..=20)
                .rev()
                .map(|e| MediaRef::Episode { season: 2, episode: e })
                .collect::<Vec<_>>()
        );
        // Daily shows are queried by air date.
        assert_eq!(jobs[0].query, "Show 2002 01 20");
    }

    #[test]
    fn test_missing_air_date_falls_back_to_episode_code() {
        let mut show = Show::new("tvmaze", 1, "Show");
        show.is_daily = true;
        show.seasons
            .push(Season::new(1, vec![Episode::new(3, "Undated", None)]));
        let mut rng = StdRng::seed_from_u64(5);

        let jobs = exploit_only().build(&show, &mut rng);

        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0].snippet.format_snippet,
            QueryFormat::EpisodeCode.key()
        );
        assert!(jobs[0].query.ends_with("S01E03"));
    }

    #[test]
    fn test_nothing_pending_builds_nothing() {
        let mut show = Show::new("tvmaze", 1, "Show");
        let mut season = dated_season(1, 2);
        season.mark_done();
        show.seasons.push(season);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(exploit_only().build(&show, &mut rng).is_empty());
    }

    trait ContainsJob {
        fn contains_job(&self, media: MediaRef) -> bool;
    }

    impl ContainsJob for Vec<QueryJob> {
        fn contains_job(&self, media: MediaRef) -> bool {
            self.iter().any(|j| j.media == media)
        }
    }
}
