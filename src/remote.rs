// AniList note gateway
// Four logical operations over the host's GraphQL transport: fetch one note,
// save one note, delete via empty save, and the paged bulk fetch. The user's
// list entry "notes" field is the remote store.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::host::RemoteTransport;
use crate::storage::normalizeText;

const NOTES_PER_PAGE: i64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("not logged in to AniList")]
    AuthMissing,
    #[error("AniList request failed: {0}")]
    CallFailed(String),
    #[error("unexpected AniList response: {0}")]
    BadResponse(String),
}

// ============================================
// QUERY DOCUMENTS
// ============================================

/// Viewer-scoped note for one media id.
const FETCH_NOTE_QUERY: &str = r#"
query ($mediaId: Int) {
  Media(id: $mediaId, type: ANIME) {
    mediaListEntry {
      notes
    }
  }
}"#;

/// Upsert the note on the viewer's list entry. An empty string doubles as
/// delete: AniList has no distinct delete primitive for this field.
const SAVE_NOTE_MUTATION: &str = r#"
mutation ($mediaId: Int, $notes: String) {
  SaveMediaListEntry(mediaId: $mediaId, notes: $notes) {
    id
    notes
  }
}"#;

const VIEWER_QUERY: &str = r#"
query {
  Viewer {
    id
  }
}"#;

/// One page of the viewer's list, server-side filtered to entries that have
/// a note at all.
const NOTES_PAGE_QUERY: &str = r#"
query ($userId: Int, $page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    pageInfo {
      hasNextPage
    }
    mediaList(userId: $userId, type: ANIME, notes_like: "%") {
      mediaId
      notes
    }
  }
}"#;

// ============================================
// RESPONSE SHAPES
// ============================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FetchNoteData {
    Media: Option<MediaNode>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    mediaListEntry: Option<ListEntryNode>,
}

#[derive(Debug, Deserialize)]
struct ListEntryNode {
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveNoteData {
    SaveMediaListEntry: Option<ListEntryNode>,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    Viewer: Option<ViewerNode>,
}

#[derive(Debug, Deserialize)]
struct ViewerNode {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct NotesPageData {
    Page: Option<PageNode>,
}

#[derive(Debug, Deserialize)]
struct PageNode {
    pageInfo: PageInfoNode,
    #[serde(default)]
    mediaList: Vec<ListRowNode>,
}

#[derive(Debug, Deserialize)]
struct PageInfoNode {
    #[serde(default)]
    hasNextPage: bool,
}

#[derive(Debug, Deserialize)]
struct ListRowNode {
    mediaId: i64,
    notes: Option<String>,
}

/// Unwrap a GraphQL response body into its typed `data` payload.
fn decode<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, RemoteError> {
    let response: GraphqlResponse<T> =
        serde_json::from_value(body).map_err(|e| RemoteError::BadResponse(e.to_string()))?;

    if let Some(errors) = response.errors {
        if !errors.is_empty() {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RemoteError::CallFailed(joined));
        }
    }

    response
        .data
        .ok_or_else(|| RemoteError::BadResponse("missing data field".to_string()))
}

// ============================================
// GATEWAY
// ============================================

pub struct RemoteGateway {
    transport: Arc<dyn RemoteTransport>,
    token: Option<String>,
}

impl RemoteGateway {
    pub fn new(transport: Arc<dyn RemoteTransport>, token: Option<String>) -> Self {
        Self { transport, token }
    }

    fn token(&self) -> Result<&str, RemoteError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(RemoteError::AuthMissing)
    }

    /// The viewer's note for `mediaId`. `Ok(None)` means no list entry or no
    /// note; callers treat both as "no remote note".
    pub async fn fetchOne(&self, mediaId: i64) -> Result<Option<String>, RemoteError> {
        let token = self.token()?;
        let body = self
            .transport
            .request(FETCH_NOTE_QUERY, json!({ "mediaId": mediaId }), token)
            .await
            .map_err(RemoteError::CallFailed)?;

        let data: FetchNoteData = decode(body)?;
        let note = data
            .Media
            .and_then(|m| m.mediaListEntry)
            .and_then(|e| e.notes)
            .map(|n| normalizeText(&n));
        debug!("[fetchOne] mediaId={} found={}", mediaId, note.is_some());
        Ok(note)
    }

    pub async fn saveOne(&self, mediaId: i64, text: &str) -> Result<(), RemoteError> {
        let token = self.token()?;
        let body = self
            .transport
            .request(SAVE_NOTE_MUTATION, json!({ "mediaId": mediaId, "notes": text }), token)
            .await
            .map_err(RemoteError::CallFailed)?;

        let data: SaveNoteData = decode(body)?;
        if data.SaveMediaListEntry.is_none() {
            return Err(RemoteError::BadResponse("save returned no entry".to_string()));
        }
        debug!("[saveOne] mediaId={} ({} bytes)", mediaId, text.len());
        Ok(())
    }

    /// AniList has no delete for this field; an empty save clears it.
    pub async fn deleteOne(&self, mediaId: i64) -> Result<(), RemoteError> {
        self.saveOne(mediaId, "").await
    }

    /// Every note on the viewer's list, paged. Failures anywhere are logged
    /// and swallowed: the partial (possibly empty) map is returned, so a
    /// short map is indistinguishable from "few remote notes".
    pub async fn fetchAll(&self) -> HashMap<i64, String> {
        let mut notes = HashMap::new();

        let token = match self.token() {
            Ok(token) => token,
            Err(_) => {
                warn!("[fetchAll] no AniList token, returning empty map");
                return notes;
            }
        };

        let viewerId = match self.fetchViewerId(token).await {
            Ok(id) => id,
            Err(e) => {
                warn!("[fetchAll] viewer lookup failed: {}", e);
                return notes;
            }
        };

        let mut page = 1;
        loop {
            let variables = json!({ "userId": viewerId, "page": page, "perPage": NOTES_PER_PAGE });
            let body = match self.transport.request(NOTES_PAGE_QUERY, variables, token).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("[fetchAll] page {} failed: {}", page, e);
                    break;
                }
            };

            let data: NotesPageData = match decode(body) {
                Ok(data) => data,
                Err(e) => {
                    warn!("[fetchAll] page {} undecodable: {}", page, e);
                    break;
                }
            };

            let Some(pageNode) = data.Page else {
                warn!("[fetchAll] page {} missing Page node", page);
                break;
            };

            for row in pageNode.mediaList {
                if let Some(text) = row.notes {
                    let text = normalizeText(&text);
                    if !text.is_empty() {
                        notes.insert(row.mediaId, text);
                    }
                }
            }

            if !pageNode.pageInfo.hasNextPage {
                break;
            }
            page += 1;
        }

        debug!("[fetchAll] collected {} remote notes", notes.len());
        notes
    }

    async fn fetchViewerId(&self, token: &str) -> Result<i64, RemoteError> {
        let body = self
            .transport
            .request(VIEWER_QUERY, json!({}), token)
            .await
            .map_err(RemoteError::CallFailed)?;

        let data: ViewerData = decode(body)?;
        data.Viewer
            .map(|v| v.id)
            .ok_or_else(|| RemoteError::BadResponse("missing Viewer".to_string()))
    }
}
