// Per-instance session state
// The explicit context object owning everything the views read and the
// engine mutates: selection, view kind, active source, overlay state, edit
// buffers and pending notices. Locks are held only across synchronous
// sections, never across an await.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::buffers::EditBuffers;
use crate::models::{Note, NoteSource, Notice, NoticeLevel, ViewState};

pub struct Session {
    pub currentMediaId: RwLock<Option<i64>>,
    /// Display title of the current selection, resolved lazily.
    pub currentTitle: RwLock<String>,
    pub view: RwLock<ViewState>,
    /// Active source; meaningful only when the policy enables the toggle.
    pub viewMode: RwLock<NoteSource>,
    pub searchQuery: RwLock<String>,
    /// Rows deleted this session, hidden until the next full reload.
    pub softDeleted: RwLock<HashSet<i64>>,
    pub allNotes: RwLock<Vec<Note>>,
    pub buffers: RwLock<EditBuffers>,
    /// The Single view's in-progress text.
    pub singleNote: RwLock<String>,
    pub trayOpen: RwLock<bool>,
    pub notices: RwLock<Vec<Notice>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            currentMediaId: RwLock::new(None),
            currentTitle: RwLock::new(String::new()),
            view: RwLock::new(ViewState::Idle),
            viewMode: RwLock::new(NoteSource::Local),
            searchQuery: RwLock::new(String::new()),
            softDeleted: RwLock::new(HashSet::new()),
            allNotes: RwLock::new(Vec::new()),
            buffers: RwLock::new(EditBuffers::new()),
            singleNote: RwLock::new(String::new()),
            trayOpen: RwLock::new(false),
            notices: RwLock::new(Vec::new()),
        }
    }

    pub fn pushNotice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.write().push(Notice::new(level, message));
    }

    /// Drain pending notices; each is delivered to the renderer exactly once.
    pub fn takeNotices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.write())
    }

    /// Staleness guard: is `id` still the current selection?
    pub fn isCurrent(&self, id: i64) -> bool {
        *self.currentMediaId.read() == Some(id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
