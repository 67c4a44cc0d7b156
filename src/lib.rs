// Allow non-snake_case names for JSON serialization compatibility with the TypeScript host renderer
#![allow(non_snake_case)]

mod aggregator;
mod buffers;
mod engine;
pub mod host;
pub mod models;
mod remote;
mod session;
mod storage;
mod view;

#[cfg(test)]
mod testutil;

use std::sync::Arc;
use tracing::info;

use crate::host::{AnimeLookup, PersistentStore, PluginConfig, RemoteTransport};
use crate::models::ModePolicy;
use crate::remote::RemoteGateway;
use crate::session::Session;
use crate::storage::NoteRepository;

pub use crate::buffers::EditBuffers;
pub use crate::host::MediaEntry;
pub use crate::models::{
    FetchMode, Note, NoteMode, NoteSource, Notice, NoticeLevel, PushMode, RenderSnapshot,
    ViewState,
};
pub use crate::remote::RemoteError;

/// Plugin instance: mode policy, component set and per-instance session state.
///
/// One `Plugin` is created at activation and torn down at deactivation; there
/// is no cross-instance sharing. All host events are methods on this type.
pub struct Plugin {
    pub(crate) policy: ModePolicy,
    pub(crate) repo: NoteRepository,
    pub(crate) gateway: RemoteGateway,
    pub(crate) lookup: Arc<dyn AnimeLookup>,
    pub(crate) session: Session,
}

impl Plugin {
    pub fn new(
        config: PluginConfig,
        store: Arc<dyn PersistentStore>,
        transport: Arc<dyn RemoteTransport>,
        lookup: Arc<dyn AnimeLookup>,
    ) -> Self {
        let policy = ModePolicy::fromPreference(&config.noteMode);
        info!(
            "[Plugin::new] mode={:?} toggle={} push={:?} fetch={:?}",
            policy.mode, policy.enableViewToggle, policy.pushMode, policy.fetchMode
        );

        Self {
            policy,
            repo: NoteRepository::new(store),
            gateway: RemoteGateway::new(transport, config.token),
            lookup,
            session: Session::new(),
        }
    }

    /// The derived mode policy (constant for the plugin lifetime).
    pub fn policy(&self) -> &ModePolicy {
        &self.policy
    }
}

pub type PluginState = Arc<Plugin>;

/// Initialize the plugin with the host-supplied collaborators.
pub fn initPlugin(
    config: PluginConfig,
    store: Arc<dyn PersistentStore>,
    transport: Arc<dyn RemoteTransport>,
    lookup: Arc<dyn AnimeLookup>,
) -> PluginState {
    Arc::new(Plugin::new(config, store, transport, lookup))
}
