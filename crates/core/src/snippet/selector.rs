//! Explore/exploit selection of query snippets.

use rand::Rng;
use tracing::debug;

use crate::show::{Show, Snippet, SnippetKind};

use super::formats::{QueryFormat, TitleVariant, TITLE_VARIANTS};

/// Probability of trying a random combination instead of the best one.
pub const DEFAULT_EXPLORE_PROBABILITY: f64 = 0.1;

/// Outcome of the explore/exploit coin flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    Explore,
    Exploit,
}

/// One entry of the (format x title variant) cross product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combination {
    pub format: QueryFormat,
    pub variant: TitleVariant,
}

/// A chosen snippet, ready to render a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Title after applying the variant.
    pub title: String,
    pub format: QueryFormat,
    /// How the selection was made. Exploit falls back to explore when the
    /// history has nothing usable.
    pub draw: Draw,
}

impl Selection {
    /// The snippet identifying this selection in the show's history.
    pub fn snippet(&self) -> Snippet {
        Snippet::new(self.title.clone(), self.format.key())
    }
}

/// Picks the (title variant, format) pair used for the next query.
#[derive(Debug, Clone)]
pub struct SnippetSelector {
    explore_probability: f64,
}

impl Default for SnippetSelector {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLORE_PROBABILITY)
    }
}

impl SnippetSelector {
    /// Out-of-range probabilities are clamped; NaN and infinities fall back
    /// to the default.
    pub fn new(explore_probability: f64) -> Self {
        let explore_probability = if explore_probability.is_finite() {
            explore_probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_EXPLORE_PROBABILITY
        };
        Self { explore_probability }
    }

    pub fn explore_probability(&self) -> f64 {
        self.explore_probability
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> Draw {
        if rng.random_bool(self.explore_probability) {
            Draw::Explore
        } else {
            Draw::Exploit
        }
    }

    /// Formats eligible for a show. Daily shows only get date-based episode
    /// formats.
    pub fn formats(&self, show: &Show, kind: SnippetKind) -> Vec<QueryFormat> {
        let all = QueryFormat::for_kind(kind);
        if show.is_daily && kind == SnippetKind::Episode {
            all.iter().copied().filter(|f| f.is_date_based()).collect()
        } else {
            all.to_vec()
        }
    }

    /// The full cross product, formats outer and title variants inner.
    pub fn combinations(&self, show: &Show, kind: SnippetKind) -> Vec<Combination> {
        self.formats(show, kind)
            .into_iter()
            .flat_map(|format| {
                TITLE_VARIANTS
                    .iter()
                    .map(move |&variant| Combination { format, variant })
            })
            .collect()
    }

    /// Flip the coin and select a snippet.
    pub fn select<R: Rng>(&self, show: &Show, kind: SnippetKind, rng: &mut R) -> Selection {
        let draw = self.draw(rng);
        self.select_with(show, kind, draw, rng)
    }

    /// Select a snippet for an already decided draw.
    pub fn select_with<R: Rng>(
        &self,
        show: &Show,
        kind: SnippetKind,
        draw: Draw,
        rng: &mut R,
    ) -> Selection {
        let combinations = self.combinations(show, kind);

        if draw == Draw::Exploit {
            if let Some(selection) = self.best_known(show, kind, &combinations) {
                return selection;
            }
        }

        let combination = combinations[rng.random_range(0..combinations.len())];
        let selection = Selection {
            title: combination.variant.apply(&show.title),
            format: combination.format,
            draw: Draw::Explore,
        };
        debug!(
            show = %show.title,
            title_snippet = %selection.title,
            format_snippet = selection.format.key(),
            "Random snippet"
        );
        selection
    }

    /// Highest scoring history entry that maps onto a registered combination.
    ///
    /// Ties go to the combination enumerated first.
    fn best_known(
        &self,
        show: &Show,
        kind: SnippetKind,
        combinations: &[Combination],
    ) -> Option<Selection> {
        let mut best: Option<(u32, usize, String, QueryFormat)> = None;

        for snippet in show.snippets(kind) {
            let Some(index) = combinations.iter().position(|c| {
                c.format.key() == snippet.format_snippet
                    && c.variant.apply(&show.title) == snippet.title_snippet
            }) else {
                continue;
            };

            let better = match &best {
                None => true,
                Some((score, best_index, _, _)) => {
                    snippet.score > *score || (snippet.score == *score && index < *best_index)
                }
            };
            if better {
                best = Some((
                    snippet.score,
                    index,
                    snippet.title_snippet.clone(),
                    combinations[index].format,
                ));
            }
        }

        best.map(|(_, _, title, format)| Selection {
            title,
            format,
            draw: Draw::Exploit,
        })
    }
}
