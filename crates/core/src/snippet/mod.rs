//! Adaptive query snippets.
//!
//! A snippet combines a title variant (the show title, possibly shortened or
//! stripped of punctuation) with a query format (how the season or episode
//! number is written). The selector mostly reuses the combination that found
//! the best-seeded torrent so far and occasionally explores a random one.
//! Search winners are fed back through [`record_result`].

mod feedback;
mod formats;
mod selector;

pub use feedback::record_result;
pub use formats::{QueryFormat, QueryTarget, TitleVariant, TITLE_VARIANTS};
pub use selector::{Combination, Draw, Selection, SnippetSelector, DEFAULT_EXPLORE_PROBABILITY};
