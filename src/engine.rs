// Reconciliation engine
// Every mutating note operation lives here, driven by the mode policy:
// which store is written, whether a local save is mirrored to AniList, and
// how the two maps merge on bulk transfers. Collaborator failures are
// converted to notices or log lines at this boundary; nothing propagates to
// the view layer as an error.

use tracing::{debug, warn};

use crate::Plugin;
use crate::aggregator::buildNoteList;
use crate::models::{FetchMode, NoteSource, NoticeLevel, PushMode};
use crate::remote::RemoteError;
use crate::storage::normalizeText;

impl Plugin {
    /// The source the views are currently reading from.
    pub(crate) fn effectiveSource(&self) -> NoteSource {
        if self.policy.enableViewToggle {
            *self.session.viewMode.read()
        } else if self.policy.isAniListOnly {
            NoteSource::AniList
        } else {
            NoteSource::Local
        }
    }

    /// True when a save bypasses the local repository entirely.
    fn savesDirectlyToRemote(&self) -> bool {
        self.policy.isAniListOnly
            || (self.policy.enableViewToggle && *self.session.viewMode.read() == NoteSource::AniList)
    }

    /// Save one note to wherever the policy says it belongs.
    ///
    /// In remote-primary configurations only AniList is written. Otherwise
    /// the local write is authoritative and a push failure never rolls it
    /// back.
    pub async fn saveSingle(&self, id: i64, text: &str) {
        debug!("[saveSingle] id={} ({} bytes)", id, text.len());

        if self.savesDirectlyToRemote() {
            match self.gateway.saveOne(id, text).await {
                Ok(()) => self.session.pushNotice(NoticeLevel::Success, "✨ Note saved to AniList!"),
                Err(RemoteError::AuthMissing) => {
                    self.session.pushNotice(NoticeLevel::Error, "Not logged in to AniList")
                }
                Err(e) => {
                    warn!("[saveSingle] remote save failed for {}: {}", id, e);
                    self.session.pushNotice(NoticeLevel::Error, "Failed to save note to AniList");
                }
            }
            return;
        }

        self.repo.write(id, text);

        if self.policy.pushMode == PushMode::Push {
            match self.gateway.saveOne(id, text).await {
                Ok(()) => self.session.pushNotice(NoticeLevel::Success, "✨ Note saved and synced!"),
                Err(RemoteError::AuthMissing) => self.session.pushNotice(
                    NoticeLevel::Info,
                    "Note saved locally (not logged in to AniList)",
                ),
                Err(e) => {
                    warn!("[saveSingle] push failed for {}: {}", id, e);
                    self.session
                        .pushNotice(NoticeLevel::Info, "Note saved locally; AniList push failed");
                }
            }
        } else {
            self.session.pushNotice(NoticeLevel::Success, "✨ Note saved successfully!");
        }
    }

    /// Delete one note from the active source and hide its row immediately.
    /// The soft-delete mark is applied on the success path of whichever
    /// branch runs.
    pub async fn deleteSingle(&self, id: i64) {
        debug!("[deleteSingle] id={}", id);

        if self.effectiveSource() == NoteSource::AniList {
            match self.gateway.deleteOne(id).await {
                Ok(()) => {
                    self.session.softDeleted.write().insert(id);
                    self.session.pushNotice(NoticeLevel::Success, "🗑️ Note deleted from AniList");
                }
                Err(RemoteError::AuthMissing) => {
                    self.session.pushNotice(NoticeLevel::Error, "Not logged in to AniList")
                }
                Err(e) => {
                    warn!("[deleteSingle] remote delete failed for {}: {}", id, e);
                    self.session.pushNotice(NoticeLevel::Error, "Failed to delete note on AniList");
                }
            }
        } else {
            self.repo.delete(id);
            self.session.softDeleted.write().insert(id);
            self.session.pushNotice(NoticeLevel::Success, "🗑️ Note deleted");
        }
    }

    /// Pull one note from AniList into the local repository (cache-on-fetch)
    /// and refresh whatever currently displays it.
    pub async fn fetchSingle(&self, id: i64) {
        debug!("[fetchSingle] id={}", id);

        let fetched = match self.gateway.fetchOne(id).await {
            Ok(note) => note,
            Err(RemoteError::AuthMissing) => {
                self.session.pushNotice(NoticeLevel::Error, "Not logged in to AniList");
                return;
            }
            Err(e) => {
                warn!("[fetchSingle] fetch failed for {}: {}", id, e);
                None
            }
        };

        let text = fetched.map(|t| normalizeText(&t)).unwrap_or_default();
        if text.is_empty() {
            self.session.pushNotice(NoticeLevel::Info, "No remote note found");
            return;
        }

        self.repo.write(id, &text);
        if self.session.isCurrent(id) {
            *self.session.singleNote.write() = text.clone();
        }
        {
            let mut buffers = self.session.buffers.write();
            if buffers.contains(id) {
                buffers.update(id, text.clone());
            }
        }
        self.session.pushNotice(NoticeLevel::Success, "⬇️ Note fetched from AniList");
    }

    /// Bulk transfer from AniList.
    ///
    /// In toggle-capable mode the result only feeds the All view (transient,
    /// nothing persisted). Otherwise it is merged into the local repository,
    /// remote wins on conflict, and the All view reloads from local.
    pub async fn fetchAllRemote(&self) {
        let remote = self.gateway.fetchAll().await;
        let count = remote.len();

        if self.policy.enableViewToggle {
            let notes = buildNoteList(self.lookup.as_ref(), &remote, NoteSource::AniList).await;
            self.applyAllNotes(notes);
            self.session
                .pushNotice(NoticeLevel::Success, format!("⬇️ Loaded {} notes from AniList", count));
            return;
        }

        self.repo.merge(&remote);
        self.reloadAllFromLocal().await;
        self.session
            .pushNotice(NoticeLevel::Success, format!("⬇️ Fetched {} notes from AniList", count));
    }

    /// Push every non-empty local note to AniList, sequentially. Per-item
    /// failures are logged and swallowed; one aggregate notice is reported.
    pub async fn pushAllLocal(&self) {
        let notes = self.repo.readAll();
        let mut ids: Vec<i64> = notes.keys().copied().collect();
        ids.sort_unstable();

        let mut pushed = 0usize;
        for id in ids {
            let text = &notes[&id];
            if text.trim().is_empty() {
                continue;
            }
            match self.gateway.saveOne(id, text).await {
                Ok(()) => pushed += 1,
                Err(RemoteError::AuthMissing) => {
                    self.session.pushNotice(NoticeLevel::Error, "Not logged in to AniList");
                    return;
                }
                Err(e) => warn!("[pushAllLocal] push failed for {}: {}", id, e),
            }
        }

        self.session
            .pushNotice(NoticeLevel::Success, format!("⬆️ Pushed {} notes to AniList", pushed));
    }

    /// Load the Single view's note text and title for `id`. Every await is a
    /// suspension point; the current selection is re-checked afterwards and
    /// stale results are discarded.
    pub(crate) async fn loadSingleNote(&self, id: i64) {
        let title = match self.lookup.getEntry(id).await {
            Ok(Some(entry)) => entry.title,
            Ok(None) => format!("Anime #{}", id),
            Err(e) => {
                warn!("[loadSingleNote] lookup failed for {}: {}", id, e);
                format!("Anime #{}", id)
            }
        };
        if !self.session.isCurrent(id) {
            debug!("[loadSingleNote] selection moved on from {}, discarding", id);
            return;
        }
        *self.session.currentTitle.write() = title;

        let text = if self.effectiveSource() == NoteSource::AniList {
            match self.gateway.fetchOne(id).await {
                Ok(note) => note.map(|t| normalizeText(&t)).unwrap_or_default(),
                Err(RemoteError::AuthMissing) => {
                    self.session.pushNotice(NoticeLevel::Error, "Not logged in to AniList");
                    String::new()
                }
                Err(e) => {
                    warn!("[loadSingleNote] remote read failed for {}: {}", id, e);
                    String::new()
                }
            }
        } else {
            let local = self.repo.read(id);
            if local.is_empty() && self.policy.fetchMode == FetchMode::IfEmpty {
                self.fillFromRemote(id).await
            } else {
                local
            }
        };

        if !self.session.isCurrent(id) {
            debug!("[loadSingleNote] selection moved on from {}, discarding", id);
            return;
        }
        *self.session.singleNote.write() = text;
    }

    /// Synced-mode gap fill: a missing local note is pulled from AniList and
    /// cached locally. Silent on failure; the explicit fetch action is the
    /// noisy path.
    async fn fillFromRemote(&self, id: i64) -> String {
        match self.gateway.fetchOne(id).await {
            Ok(Some(remote)) => {
                let text = normalizeText(&remote);
                if !text.is_empty() {
                    self.repo.write(id, &text);
                }
                text
            }
            Ok(None) => String::new(),
            Err(e) => {
                debug!("[fillFromRemote] skipping remote fill for {}: {}", id, e);
                String::new()
            }
        }
    }

    /// Rebuild the All view from the local repository.
    pub(crate) async fn reloadAllFromLocal(&self) {
        let map = self.repo.readAll();
        let notes = buildNoteList(self.lookup.as_ref(), &map, NoteSource::Local).await;
        self.applyAllNotes(notes);
    }
}
