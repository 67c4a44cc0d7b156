// View state machine and render boundary
// Transitions between Idle / Single / All, plus the declarative snapshot the
// host renderer consumes. Every transition completes regardless of
// collaborator failure; errors surface as notices only.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::Plugin;
use crate::aggregator::buildNoteList;
use crate::models::{
    FetchMode, GlobalAction, Note, NoteRow, NoteSource, PushMode, RenderSnapshot, RowAction,
    SingleAction, SingleField, ViewState,
};

/// Minimum pause before reopening a view after a source toggle, so a fast
/// fetch does not flash the UI.
const SETTLE_DELAY_MS: u64 = 400;

const IDLE_PROMPT: &str = "✏️ Click on an anime to add/edit notes 📋";

impl Plugin {
    // ============================================
    // TRANSITIONS
    // ============================================

    /// Selection/navigation event: enter the Single view for `id` and load
    /// its note from the effective source.
    pub async fn selectAnime(&self, id: i64) {
        info!("[selectAnime] id={}", id);
        {
            *self.session.currentMediaId.write() = Some(id);
            *self.session.currentTitle.write() = String::new();
            *self.session.singleNote.write() = String::new();
            *self.session.view.write() = ViewState::Single;
            *self.session.trayOpen.write() = true;
        }
        self.loadSingleNote(id).await;
    }

    /// Navigating away from a detail context clears the selection.
    pub fn clearSelection(&self) {
        debug!("[clearSelection]");
        *self.session.currentMediaId.write() = None;
        *self.session.currentTitle.write() = String::new();
        *self.session.singleNote.write() = String::new();
        *self.session.view.write() = ViewState::Idle;
        *self.session.trayOpen.write() = false;
    }

    /// Tray icon clicked: reopen, re-resolving the current selection so a
    /// note edited elsewhere shows fresh.
    pub async fn trayClicked(&self) {
        *self.session.trayOpen.write() = true;
        let current = *self.session.currentMediaId.read();
        match current {
            Some(id) => {
                *self.session.view.write() = ViewState::Single;
                self.loadSingleNote(id).await;
            }
            None => {
                *self.session.view.write() = ViewState::Idle;
            }
        }
    }

    /// Cancel closes the tray without writing anything.
    pub fn cancel(&self) {
        *self.session.trayOpen.write() = false;
    }

    /// Keystroke-level edit of the Single view's field.
    pub fn editSingleNote(&self, text: String) {
        *self.session.singleNote.write() = text;
    }

    /// Keystroke-level edit of one All-view row buffer.
    pub fn editBuffer(&self, id: i64, text: String) {
        self.session.buffers.write().update(id, text);
    }

    pub fn setSearchQuery(&self, text: String) {
        *self.session.searchQuery.write() = text;
    }

    /// Save the Single view's field and close the tray.
    pub async fn saveCurrent(&self) {
        let current = *self.session.currentMediaId.read();
        let Some(id) = current else {
            return;
        };
        let text = self.session.singleNote.read().clone();
        self.saveSingle(id, &text).await;
        *self.session.trayOpen.write() = false;
    }

    /// Save one All-view row from its live buffer.
    pub async fn saveRow(&self, id: i64) {
        let text = {
            let notes = self.session.allNotes.read();
            let fallback = notes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.note.clone())
                .unwrap_or_default();
            self.session.buffers.read().get(id, &fallback)
        };
        self.saveSingle(id, &text).await;
    }

    /// "View all" from Idle or Single: build the aggregate from the
    /// effective source and open.
    pub async fn openAllNotes(&self) {
        let source = self.effectiveSource();
        info!("[openAllNotes] source={:?}", source);
        let map = match source {
            NoteSource::Local => self.repo.readAll(),
            NoteSource::AniList => self.gateway.fetchAll().await,
        };
        let notes = buildNoteList(self.lookup.as_ref(), &map, source).await;
        self.applyAllNotes(notes);
    }

    /// "Back" from the All view: reload the single note for the current
    /// selection (a concurrent remote edit made while in All must show), or
    /// fall back to Idle without one.
    pub async fn backToSingle(&self) {
        let current = *self.session.currentMediaId.read();
        match current {
            Some(id) => {
                *self.session.view.write() = ViewState::Single;
                self.loadSingleNote(id).await;
            }
            None => {
                *self.session.view.write() = ViewState::Idle;
            }
        }
    }

    /// Flip the active source and re-resolve whatever is displayed against
    /// the new one. A short settle pause runs first so a fast fetch does not
    /// flash; a second toggle during the pause supersedes this one.
    pub async fn toggleSource(&self) {
        if !self.policy.enableViewToggle {
            warn!("[toggleSource] toggle disabled in {:?} mode", self.policy.mode);
            return;
        }

        let target = {
            let mut viewMode = self.session.viewMode.write();
            *viewMode = viewMode.other();
            *viewMode
        };
        debug!("[toggleSource] switching to {:?}", target);

        tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;
        if *self.session.viewMode.read() != target {
            debug!("[toggleSource] superseded before settle, discarding");
            return;
        }

        let view = *self.session.view.read();
        match view {
            ViewState::All => {
                let map = match target {
                    NoteSource::Local => self.repo.readAll(),
                    NoteSource::AniList => self.gateway.fetchAll().await,
                };
                let notes = buildNoteList(self.lookup.as_ref(), &map, target).await;
                if *self.session.viewMode.read() != target {
                    return;
                }
                self.applyAllNotes(notes);
            }
            ViewState::Single => {
                let current = *self.session.currentMediaId.read();
                if let Some(id) = current {
                    self.loadSingleNote(id).await;
                }
            }
            ViewState::Idle => {}
        }
    }

    /// Install a freshly built note list: reconcile buffers, reset the
    /// overlay state and open the All view. The view opens regardless of the
    /// seeding outcome.
    pub(crate) fn applyAllNotes(&self, notes: Vec<Note>) {
        self.session.buffers.write().seed(&notes);
        *self.session.allNotes.write() = notes;
        self.session.softDeleted.write().clear();
        *self.session.searchQuery.write() = String::new();
        *self.session.view.write() = ViewState::All;
    }

    // ============================================
    // RENDER SNAPSHOT
    // ============================================

    /// Declarative description of the current view for the host renderer.
    /// Pending notices are drained into the snapshot.
    pub fn renderSnapshot(&self) -> RenderSnapshot {
        let view = *self.session.view.read();
        let source = self.effectiveSource();

        let (header, singleField, rows, actions) = match view {
            ViewState::Idle => (
                IDLE_PROMPT.to_string(),
                None,
                Vec::new(),
                vec![GlobalAction::ViewAll],
            ),
            ViewState::Single => {
                let title = self.session.currentTitle.read().clone();
                let mut actions = vec![GlobalAction::ViewAll];
                if self.policy.enableViewToggle {
                    actions.push(GlobalAction::ToggleSource);
                }
                (
                    format!("✏️ Notes for: 📺 {}", title),
                    Some(SingleField {
                        label: title,
                        value: self.session.singleNote.read().clone(),
                        actions: self.singleActions(source),
                    }),
                    Vec::new(),
                    actions,
                )
            }
            ViewState::All => {
                let rows = self.visibleRows(source);
                let mut actions = vec![GlobalAction::Back];
                if self.showFetchAll(source) {
                    actions.push(GlobalAction::FetchAllRemote);
                }
                if self.showPushAll(source) {
                    actions.push(GlobalAction::PushAllLocal);
                }
                if self.policy.enableViewToggle {
                    actions.push(GlobalAction::ToggleSource);
                }
                (format!("📋 All notes ({})", rows.len()), None, rows, actions)
            }
        };

        RenderSnapshot {
            view,
            header,
            trayOpen: *self.session.trayOpen.read(),
            showSourceToggle: self.policy.enableViewToggle,
            activeSource: source,
            searchValue: self.session.searchQuery.read().clone(),
            singleField,
            rows,
            actions,
            notices: self.session.takeNotices(),
        }
    }

    fn singleActions(&self, source: NoteSource) -> Vec<SingleAction> {
        let mut actions = vec![SingleAction::Save, SingleAction::Cancel];
        if self.rowCanFetchRemote(source) {
            actions.push(SingleAction::FetchRemote);
        }
        actions
    }

    /// The explicit per-item fetch only makes sense when reading local with a
    /// remote to pull from.
    fn rowCanFetchRemote(&self, source: NoteSource) -> bool {
        source == NoteSource::Local && !self.policy.isLocalOnly
    }

    /// Bulk fetch: synced mode merges into local; dual-view refreshes the
    /// remote list while it is the active source.
    fn showFetchAll(&self, source: NoteSource) -> bool {
        self.policy.fetchMode == FetchMode::IfEmpty
            || (self.policy.enableViewToggle && source == NoteSource::AniList)
    }

    /// Bulk push: synced mode, or dual-view while showing the local list.
    fn showPushAll(&self, source: NoteSource) -> bool {
        (self.policy.pushMode == PushMode::Push && !self.policy.isAniListOnly)
            || (self.policy.enableViewToggle && source == NoteSource::Local)
    }

    /// All-view rows after the soft-delete overlay and search filter, with
    /// text taken from the live edit buffers.
    fn visibleRows(&self, source: NoteSource) -> Vec<NoteRow> {
        let query = self.session.searchQuery.read().to_lowercase();
        let softDeleted = self.session.softDeleted.read();
        let buffers = self.session.buffers.read();

        let mut rowActions = vec![RowAction::Save, RowAction::Delete];
        if self.rowCanFetchRemote(source) {
            rowActions.push(RowAction::FetchRemote);
        }

        self.session
            .allNotes
            .read()
            .iter()
            .filter(|note| !softDeleted.contains(&note.id))
            .map(|note| NoteRow {
                id: note.id,
                title: note.title.clone(),
                coverImage: note.coverImage.clone(),
                text: buffers.get(note.id, &note.note),
                actions: rowActions.clone(),
            })
            .filter(|row| {
                query.is_empty()
                    || row.title.to_lowercase().contains(&query)
                    || row.text.to_lowercase().contains(&query)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoticeLevel;
    use crate::testutil::{StubLookup, harness, harnessWith};

    #[tokio::test]
    async fn test_idle_render_prompts_for_selection() {
        let h = harness("local-only");
        let snapshot = h.plugin.renderSnapshot();

        assert_eq!(snapshot.view, ViewState::Idle);
        assert_eq!(snapshot.header, IDLE_PROMPT);
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.actions, vec![GlobalAction::ViewAll]);
    }

    #[tokio::test]
    async fn test_select_shows_title_and_local_note() {
        let lookup = StubLookup::new().withEntry(42, "Cowboy Bebop", "cb.png");
        let h = harnessWith("local-only", None, lookup);
        h.plugin.repo.write(42, "rewatch session 5");

        h.plugin.selectAnime(42).await;
        let snapshot = h.plugin.renderSnapshot();

        assert_eq!(snapshot.view, ViewState::Single);
        assert_eq!(snapshot.header, "✏️ Notes for: 📺 Cowboy Bebop");
        let field = snapshot.singleField.unwrap();
        assert_eq!(field.value, "rewatch session 5");
        assert!(snapshot.trayOpen);
    }

    #[tokio::test]
    async fn test_stale_single_load_is_discarded() {
        let lookup = StubLookup::new().withEntry(1, "First", "").withEntry(2, "Second", "");
        let h = harnessWith("local-only", None, lookup);
        h.plugin.repo.write(1, "one");
        h.plugin.repo.write(2, "two");

        h.plugin.selectAnime(2).await;
        // A load for id 1 resolving after the selection moved to 2 must not
        // overwrite the newer state.
        h.plugin.loadSingleNote(1).await;

        assert_eq!(*h.plugin.session.currentTitle.read(), "Second");
        assert_eq!(*h.plugin.session.singleNote.read(), "two");
    }

    #[tokio::test]
    async fn test_deleted_row_hidden_before_and_after_reload() {
        let h = harness("local-only");
        h.plugin.repo.write(1, "a");
        h.plugin.repo.write(2, "b");
        h.plugin.openAllNotes().await;

        h.plugin.deleteSingle(1).await;
        let snapshot = h.plugin.renderSnapshot();
        let ids: Vec<i64> = snapshot.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);

        // Full reload clears the overlay but the row stays gone for real.
        h.plugin.openAllNotes().await;
        assert!(h.plugin.session.softDeleted.read().is_empty());
        let snapshot = h.plugin.renderSnapshot();
        let ids: Vec<i64> = snapshot.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_search_filters_rows_case_insensitively() {
        let lookup = StubLookup::new()
            .withEntry(1, "Cowboy Bebop", "")
            .withEntry(2, "Monster", "");
        let h = harnessWith("local-only", None, lookup);
        h.plugin.repo.write(1, "space jazz");
        h.plugin.repo.write(2, "thriller");
        h.plugin.openAllNotes().await;

        h.plugin.setSearchQuery("BEBOP".to_string());
        let snapshot = h.plugin.renderSnapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].id, 1);

        // Note text matches too.
        h.plugin.setSearchQuery("thriller".to_string());
        let snapshot = h.plugin.renderSnapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].id, 2);

        h.plugin.setSearchQuery(String::new());
        assert_eq!(h.plugin.renderSnapshot().rows.len(), 2);
    }

    #[tokio::test]
    async fn test_rows_read_from_live_buffers() {
        let h = harness("local-only");
        h.plugin.repo.write(1, "stored");
        h.plugin.openAllNotes().await;

        h.plugin.editBuffer(1, "being edited".to_string());
        let snapshot = h.plugin.renderSnapshot();
        assert_eq!(snapshot.rows[0].text, "being edited");
        // The store is untouched until an explicit save.
        assert_eq!(h.plugin.repo.read(1), "stored");
    }

    #[tokio::test]
    async fn test_save_row_persists_buffer_text() {
        let h = harness("local-only");
        h.plugin.repo.write(1, "stored");
        h.plugin.openAllNotes().await;

        h.plugin.editBuffer(1, "edited".to_string());
        h.plugin.saveRow(1).await;
        assert_eq!(h.plugin.repo.read(1), "edited");
    }

    #[tokio::test]
    async fn test_back_reflects_concurrent_edit() {
        let h = harness("local-only");
        h.plugin.repo.write(1, "before");
        h.plugin.selectAnime(1).await;
        h.plugin.openAllNotes().await;

        // Edited elsewhere while the All view was open.
        h.plugin.repo.write(1, "after");
        h.plugin.backToSingle().await;

        assert_eq!(*h.plugin.session.view.read(), ViewState::Single);
        assert_eq!(*h.plugin.session.singleNote.read(), "after");
    }

    #[tokio::test]
    async fn test_back_without_selection_goes_idle() {
        let h = harness("local-only");
        h.plugin.openAllNotes().await;
        h.plugin.backToSingle().await;
        assert_eq!(*h.plugin.session.view.read(), ViewState::Idle);
    }

    #[tokio::test]
    async fn test_toggle_is_noop_outside_dual_view() {
        let h = harness("local-anilist-synced");
        h.plugin.toggleSource().await;
        assert_eq!(*h.plugin.session.viewMode.read(), NoteSource::Local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_reloads_all_view_from_new_source() {
        let lookup = StubLookup::new().withEntry(1, "Local Show", "").withEntry(2, "Remote Show", "");
        let h = harnessWith("dual-view", Some("token"), lookup);
        h.plugin.repo.write(1, "local note");
        h.transport.seedNote(2, "remote note");

        h.plugin.openAllNotes().await;
        assert_eq!(h.plugin.renderSnapshot().rows[0].id, 1);

        h.plugin.toggleSource().await;
        assert_eq!(*h.plugin.session.viewMode.read(), NoteSource::AniList);
        let snapshot = h.plugin.renderSnapshot();
        assert_eq!(snapshot.activeSource, NoteSource::AniList);
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_reloads_single_note_from_remote() {
        let lookup = StubLookup::new().withEntry(7, "Show", "");
        let h = harnessWith("dual-view", Some("token"), lookup);
        h.plugin.repo.write(7, "local");
        h.transport.seedNote(7, "remote");

        h.plugin.selectAnime(7).await;
        assert_eq!(*h.plugin.session.singleNote.read(), "local");

        h.plugin.toggleSource().await;
        assert_eq!(*h.plugin.session.singleNote.read(), "remote");
    }

    #[tokio::test]
    async fn test_cancel_closes_tray_without_writing() {
        let h = harness("local-only");
        h.plugin.selectAnime(1).await;
        h.plugin.editSingleNote("draft".to_string());
        h.plugin.cancel();

        assert!(!*h.plugin.session.trayOpen.read());
        assert_eq!(h.plugin.repo.read(1), "");
    }

    #[tokio::test]
    async fn test_save_current_writes_and_closes_tray() {
        let h = harness("local-only");
        h.plugin.selectAnime(1).await;
        h.plugin.editSingleNote("done".to_string());
        h.plugin.saveCurrent().await;

        assert_eq!(h.plugin.repo.read(1), "done");
        assert!(!*h.plugin.session.trayOpen.read());
    }

    #[tokio::test]
    async fn test_notices_drain_exactly_once() {
        let h = harness("local-only");
        h.plugin.session.pushNotice(NoticeLevel::Success, "saved");

        let first = h.plugin.renderSnapshot();
        assert_eq!(first.notices.len(), 1);
        let second = h.plugin.renderSnapshot();
        assert!(second.notices.is_empty());
    }

    #[tokio::test]
    async fn test_mode_gates_affordances() {
        // local-only: no remote affordances anywhere.
        let h = harness("local-only");
        h.plugin.repo.write(1, "a");
        h.plugin.openAllNotes().await;
        let snapshot = h.plugin.renderSnapshot();
        assert!(!snapshot.actions.contains(&GlobalAction::FetchAllRemote));
        assert!(!snapshot.actions.contains(&GlobalAction::PushAllLocal));
        assert!(!snapshot.rows[0].actions.contains(&RowAction::FetchRemote));
        assert!(!snapshot.showSourceToggle);

        // synced: both bulk transfers, per-row fetch.
        let h = harness("local-anilist-synced");
        h.plugin.repo.write(1, "a");
        h.plugin.openAllNotes().await;
        let snapshot = h.plugin.renderSnapshot();
        assert!(snapshot.actions.contains(&GlobalAction::FetchAllRemote));
        assert!(snapshot.actions.contains(&GlobalAction::PushAllLocal));
        assert!(snapshot.rows[0].actions.contains(&RowAction::FetchRemote));

        // anilist-only: remote list, no local transfer affordances.
        let h = harness("anilist-only");
        h.transport.seedNote(1, "r");
        h.plugin.openAllNotes().await;
        let snapshot = h.plugin.renderSnapshot();
        assert_eq!(snapshot.activeSource, NoteSource::AniList);
        assert!(!snapshot.actions.contains(&GlobalAction::FetchAllRemote));
        assert!(!snapshot.actions.contains(&GlobalAction::PushAllLocal));
        assert!(!snapshot.rows[0].actions.contains(&RowAction::FetchRemote));
    }
}
