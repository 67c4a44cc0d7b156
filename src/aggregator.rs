// Note aggregator - builds the display-ready All-view list
// Read-only and idempotent: same source map + same lookup results give the
// same ordered sequence.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::host::AnimeLookup;
use crate::models::{Note, NoteSource};
use crate::storage::normalizeText;

/// Build a sorted note list from either source map, resolving titles and
/// cover images best-effort. Lookup failures never block the data path: the
/// title falls back to a synthesized placeholder and the cover stays empty.
///
/// Ids are visited in ascending order, then the result is sorted ascending by
/// case-folded title (stable, so equal titles keep id order).
pub async fn buildNoteList(
    lookup: &dyn AnimeLookup,
    source: &HashMap<i64, String>,
    sourceKind: NoteSource,
) -> Vec<Note> {
    let mut ids: Vec<i64> = source.keys().copied().collect();
    ids.sort_unstable();
    debug!("[buildNoteList] building {} notes from {:?} source", ids.len(), sourceKind);

    let mut notes = Vec::with_capacity(ids.len());
    for id in ids {
        let text = source.get(&id).map(|t| normalizeText(t)).unwrap_or_default();
        let (title, coverImage) = match lookup.getEntry(id).await {
            Ok(Some(entry)) => (entry.title, entry.coverImage),
            Ok(None) => (placeholderTitle(id), String::new()),
            Err(e) => {
                warn!("[buildNoteList] lookup failed for {}: {}", id, e);
                (placeholderTitle(id), String::new())
            }
        };
        notes.push(Note { id, title, note: text, coverImage });
    }

    notes.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    notes
}

fn placeholderTitle(id: i64) -> String {
    format!("Anime #{}", id)
}
