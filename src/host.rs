// Host collaborator contracts
// The core never talks to the store, the GraphQL transport or the anime
// catalog directly; the host injects these at activation.

use futures::future::BoxFuture;
use serde::Deserialize;

/// Display enrichment for a media id (title + cover art URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub title: String,
    pub coverImage: String,
}

/// The host's persistent key/value store.
///
/// Values are opaque JSON; the core uses a single key and always
/// read-modify-writes the whole map stored under it.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&self, key: &str, value: serde_json::Value);
}

/// The host's GraphQL transport: one query/mutate call, token attached.
///
/// The returned value is the full response body (`data` + optional `errors`);
/// the gateway owns decoding it.
pub trait RemoteTransport: Send + Sync {
    fn request<'a>(
        &'a self,
        query: &'a str,
        variables: serde_json::Value,
        token: &'a str,
    ) -> BoxFuture<'a, Result<serde_json::Value, String>>;
}

/// Anime catalog lookup, used only for display enrichment.
///
/// `Ok(None)` means the id is unknown to the catalog; `Err` is a lookup
/// failure. Both are non-fatal to every caller in this crate.
pub trait AnimeLookup: Send + Sync {
    fn getEntry(&self, mediaId: i64) -> BoxFuture<'_, Result<Option<MediaEntry>, String>>;
}

/// Activation-time configuration, read once from the host's preferences.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PluginConfig {
    /// One of `local-only | anilist-only | local-anilist-synced | dual-view`;
    /// anything else falls back to `dual-view`.
    #[serde(default)]
    pub noteMode: String,
    /// AniList access token, if the user is logged in. Acquisition is the
    /// host's business.
    #[serde(default)]
    pub token: Option<String>,
}
