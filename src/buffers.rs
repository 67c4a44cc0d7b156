// Edit buffer manager - per-row in-progress text for the All view
// Buffers survive re-renders and are reconciled, not replaced, when the
// underlying list reloads. Nothing here touches a store; an explicit save
// action moves a buffer's text out.

use std::collections::HashMap;

use crate::models::Note;

#[derive(Debug, Default)]
pub struct EditBuffers {
    buffers: HashMap<i64, String>,
}

impl EditBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile buffers with a freshly built note list.
    ///
    /// Reload wins: an existing buffer for a still-present id is overwritten
    /// with the note's current text, discarding any unsaved edit. Buffers for
    /// ids no longer present are pruned. Infallible; callers install the new
    /// list and open the view regardless of the outcome so the All view can
    /// never get stuck unopenable.
    pub fn seed(&mut self, notes: &[Note]) -> bool {
        self.buffers.retain(|id, _| notes.iter().any(|n| n.id == *id));
        for note in notes {
            self.buffers.insert(note.id, note.note.clone());
        }
        true
    }

    /// Live buffer value, falling back to the note's stored text.
    pub fn get(&self, id: i64, fallback: &str) -> String {
        self.buffers
            .get(&id)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn update(&mut self, id: i64, text: String) {
        self.buffers.insert(id, text);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.buffers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
