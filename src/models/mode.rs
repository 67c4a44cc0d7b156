// Mode policy - derived once from the user's note-mode preference
// Every other component consults these flags for source-of-truth and
// transfer direction; they never change after plugin initialization.

use serde::Serialize;
use tracing::warn;

/// The four recognized note modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteMode {
    LocalOnly,
    AnilistOnly,
    LocalAnilistSynced,
    DualView,
}

impl NoteMode {
    pub fn fromPreference(value: &str) -> Self {
        match value {
            "local-only" => Self::LocalOnly,
            "anilist-only" => Self::AnilistOnly,
            "local-anilist-synced" => Self::LocalAnilistSynced,
            "dual-view" => Self::DualView,
            other => {
                warn!("[NoteMode::fromPreference] unrecognized mode {:?}, using dual-view", other);
                Self::DualView
            }
        }
    }
}

/// Whether a local save is mirrored to AniList.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushMode {
    Push,
    LocalOnly,
}

/// When a single-note load consults the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Pull from AniList when the local note is empty (synced mode).
    IfEmpty,
    /// Always read from AniList (anilist-only mode).
    Always,
    /// Only on the explicit fetch action.
    OnDemand,
}

/// Derived flags, read-only inputs to every other component.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModePolicy {
    pub mode: NoteMode,
    pub enableViewToggle: bool,
    pub pushMode: PushMode,
    pub fetchMode: FetchMode,
    pub isAniListOnly: bool,
    pub isLocalOnly: bool,
}

impl ModePolicy {
    pub fn fromPreference(value: &str) -> Self {
        Self::fromMode(NoteMode::fromPreference(value))
    }

    pub fn fromMode(mode: NoteMode) -> Self {
        match mode {
            NoteMode::LocalOnly => Self {
                mode,
                enableViewToggle: false,
                pushMode: PushMode::LocalOnly,
                fetchMode: FetchMode::OnDemand,
                isAniListOnly: false,
                isLocalOnly: true,
            },
            NoteMode::AnilistOnly => Self {
                mode,
                enableViewToggle: false,
                pushMode: PushMode::Push,
                fetchMode: FetchMode::Always,
                isAniListOnly: true,
                isLocalOnly: false,
            },
            NoteMode::LocalAnilistSynced => Self {
                mode,
                enableViewToggle: false,
                pushMode: PushMode::Push,
                fetchMode: FetchMode::IfEmpty,
                isAniListOnly: false,
                isLocalOnly: false,
            },
            NoteMode::DualView => Self {
                mode,
                enableViewToggle: true,
                pushMode: PushMode::LocalOnly,
                fetchMode: FetchMode::OnDemand,
                isAniListOnly: false,
                isLocalOnly: false,
            },
        }
    }
}
