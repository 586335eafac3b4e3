//! Pending-item resolution and the daily-show heuristic.

use super::{EpisodeRef, Season, Show};

/// A season needs more than this many episodes before it can look daily.
const DAILY_MIN_EPISODES: usize = 30;

impl Show {
    /// Seasons that can be fetched as a single bundle.
    ///
    /// A season qualifies when the show is not daily, the season is not the
    /// highest-numbered one (it may still be airing) and none of its episodes
    /// has been acquired yet.
    pub fn pending_seasons(&self) -> Vec<&Season> {
        self.seasons
            .iter()
            .filter(|season| self.is_pending_season(season))
            .collect()
    }

    /// Pending episodes of every season not covered by [`Show::pending_seasons`].
    pub fn pending_episodes(&self) -> Vec<EpisodeRef<'_>> {
        self.seasons
            .iter()
            .filter(|season| !self.is_pending_season(season))
            .flat_map(|season| season.pending_episodes())
            .collect()
    }

    fn is_pending_season(&self, season: &Season) -> bool {
        !self.is_daily && !self.is_last_season(season) && season.all_episodes_pending()
    }

    // Seasons are stored in discovery order, so scan them all.
    fn is_last_season(&self, season: &Season) -> bool {
        !self.seasons.iter().any(|s| s.season > season.season)
    }

    /// Guess whether the show airs daily.
    ///
    /// Looks at the second-to-last season (or the only one): with more than
    /// 30 episodes and its 5th and 6th episode airing on consecutive days the
    /// show is considered daily. Missing data always yields `false`.
    pub fn determine_is_daily(&self) -> bool {
        let index = self.seasons.len().saturating_sub(2);
        let Some(season) = self.seasons.get(index) else {
            return false;
        };
        if season.episodes.len() <= DAILY_MIN_EPISODES {
            return false;
        }

        // Early in the season, before any mid-season break.
        let (Some(first), Some(second)) = (season.episodes.get(4), season.episodes.get(5)) else {
            return false;
        };
        match (first.air_date, second.air_date) {
            (Some(d1), Some(d2)) => (d2 - d1).num_days() == 1,
            _ => false,
        }
    }

    /// Run the daily heuristic and cache its verdict on the show.
    pub fn update_is_daily(&mut self) -> bool {
        self.is_daily = self.determine_is_daily();
        self.is_daily
    }

    /// Human readable list of what is still pending.
    ///
    /// Seasons come first, followed by at most `limit` episodes (the last ones
    /// in storage order).
    pub fn pending_summary(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .pending_seasons()
            .iter()
            .map(|s| format!("Pending: {} season {}", self.title, s.season))
            .collect();

        let episodes = self.pending_episodes();
        if episodes.len() > limit {
            lines.push("<snip>".to_string());
        }
        let skip = episodes.len().saturating_sub(limit);
        lines.extend(episodes.iter().skip(skip).map(|e| {
            format!(
                "Pending: {} season {} episode {}",
                self.title, e.season, e.episode.episode
            )
        }));
        lines
    }
}
