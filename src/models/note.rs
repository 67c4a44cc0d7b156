// Note projection for the view layer
// Persisted state is only id -> note text; title and cover image are
// resolved lazily and never stored.

use serde::{Deserialize, Serialize};

/// A display-ready note row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Media identifier (unique, stable, host-assigned).
    pub id: i64,
    pub title: String,
    /// User text, may be empty.
    pub note: String,
    /// Cover art URL, may be empty.
    pub coverImage: String,
}

/// Which backing source a view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSource {
    Local,
    AniList,
}

impl NoteSource {
    pub fn other(self) -> Self {
        match self {
            Self::Local => Self::AniList,
            Self::AniList => Self::Local,
        }
    }
}
