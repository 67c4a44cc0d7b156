// Render boundary - declarative view description consumed by the host renderer
// The renderer owns widgets, layout and styling; the core only says what is
// visible and which actions are enabled.

use serde::Serialize;

use super::note::NoteSource;
use super::notice::Notice;

/// The two-level view plus the empty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    /// No selection: prompt to pick an anime or view all notes.
    Idle,
    /// One media id selected, showing its note.
    Single,
    /// Aggregate list of all notes from the active source.
    All,
}

/// View-level actions (outside any particular row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GlobalAction {
    ViewAll,
    Back,
    FetchAllRemote,
    PushAllLocal,
    ToggleSource,
}

/// Actions on the single-view note field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SingleAction {
    Save,
    Cancel,
    FetchRemote,
}

/// Per-row actions in the All view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowAction {
    Save,
    Delete,
    FetchRemote,
}

/// The editable field of the Single view.
#[derive(Debug, Clone, Serialize)]
pub struct SingleField {
    pub label: String,
    pub value: String,
    pub actions: Vec<SingleAction>,
}

/// One visible row of the All view, text taken from the live edit buffer.
#[derive(Debug, Clone, Serialize)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub coverImage: String,
    pub text: String,
    pub actions: Vec<RowAction>,
}

/// Everything the renderer needs for one pass.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub view: ViewState,
    pub header: String,
    pub trayOpen: bool,
    /// Whether the source toggle affordance is shown at all.
    pub showSourceToggle: bool,
    pub activeSource: NoteSource,
    pub searchValue: String,
    pub singleField: Option<SingleField>,
    pub rows: Vec<NoteRow>,
    pub actions: Vec<GlobalAction>,
    /// Drained on every snapshot; each notice is delivered exactly once.
    pub notices: Vec<Notice>,
}
