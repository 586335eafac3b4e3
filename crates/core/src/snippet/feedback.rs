//! Writes search winners back into a show's snippet history.

use tracing::debug;

use crate::show::{Show, Snippet, SnippetKind};

/// Store `score` for the snippet's (title, format) pair.
///
/// An existing entry for the same pair is overwritten, otherwise a new entry
/// is appended.
pub fn record_result(show: &mut Show, kind: SnippetKind, snippet: &Snippet, score: u32) {
    let history = show.snippets_mut(kind);
    let updated = Snippet {
        score,
        ..snippet.clone()
    };

    match history.iter_mut().find(|s| s.same_pair(snippet)) {
        Some(existing) => *existing = updated,
        None => history.push(updated),
    }

    debug!(
        kind = ?kind,
        title_snippet = %snippet.title_snippet,
        format_snippet = %snippet.format_snippet,
        score = score,
        "Recorded snippet score"
    );
}
