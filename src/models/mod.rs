// Models module for the anime-notes core
// All fields use camelCase for consistency with the host renderer

pub mod mode;
pub mod note;
pub mod notice;
pub mod render;

pub use mode::{FetchMode, ModePolicy, NoteMode, PushMode};
pub use note::{Note, NoteSource};
pub use notice::{Notice, NoticeLevel};
pub use render::{GlobalAction, NoteRow, RenderSnapshot, RowAction, SingleAction, SingleField, ViewState};
