// Shared test doubles for the host collaborators

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::host::{AnimeLookup, MediaEntry, PersistentStore, PluginConfig, RemoteTransport};
use crate::{Plugin, initPlugin};

/// In-memory host store.
pub struct MemoryStore {
    data: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { data: Mutex::new(HashMap::new()) }
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.data.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.data.lock().insert(key.to_string(), value);
    }
}

/// Scripted AniList transport: a remote note map plus call recording.
pub struct FakeTransport {
    notes: Mutex<HashMap<i64, String>>,
    failing: Mutex<bool>,
    saveCalls: Mutex<Vec<(i64, String)>>,
    fetchOneCalls: Mutex<Vec<i64>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(HashMap::new()),
            failing: Mutex::new(false),
            saveCalls: Mutex::new(Vec::new()),
            fetchOneCalls: Mutex::new(Vec::new()),
        }
    }

    pub fn seedNote(&self, id: i64, text: &str) {
        self.notes.lock().insert(id, text.to_string());
    }

    pub fn setFailing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn saveCalls(&self) -> Vec<(i64, String)> {
        self.saveCalls.lock().clone()
    }

    pub fn fetchOneCalls(&self) -> Vec<i64> {
        self.fetchOneCalls.lock().clone()
    }

    pub fn remoteNote(&self, id: i64) -> Option<String> {
        self.notes.lock().get(&id).cloned()
    }

    pub fn remoteCallCount(&self) -> usize {
        self.saveCalls.lock().len() + self.fetchOneCalls.lock().len()
    }
}

impl RemoteTransport for FakeTransport {
    fn request<'a>(
        &'a self,
        query: &'a str,
        variables: Value,
        _token: &'a str,
    ) -> BoxFuture<'a, Result<Value, String>> {
        Box::pin(async move {
            if query.contains("SaveMediaListEntry") {
                let id = variables["mediaId"].as_i64().unwrap_or_default();
                let text = variables["notes"].as_str().unwrap_or_default().to_string();
                self.saveCalls.lock().push((id, text.clone()));
                if *self.failing.lock() {
                    return Err("network down".to_string());
                }
                self.notes.lock().insert(id, text.clone());
                return Ok(json!({
                    "data": { "SaveMediaListEntry": { "id": id, "notes": text } }
                }));
            }

            if *self.failing.lock() {
                return Err("network down".to_string());
            }

            if query.contains("Viewer") {
                return Ok(json!({ "data": { "Viewer": { "id": 9001 } } }));
            }

            if query.contains("Page(") {
                // One page is enough for tests.
                let list: Vec<Value> = self
                    .notes
                    .lock()
                    .iter()
                    .map(|(id, text)| json!({ "mediaId": id, "notes": text }))
                    .collect();
                return Ok(json!({
                    "data": {
                        "Page": {
                            "pageInfo": { "hasNextPage": false },
                            "mediaList": list
                        }
                    }
                }));
            }

            if query.contains("mediaListEntry") {
                let id = variables["mediaId"].as_i64().unwrap_or_default();
                self.fetchOneCalls.lock().push(id);
                let entry = self
                    .notes
                    .lock()
                    .get(&id)
                    .map(|text| json!({ "notes": text }))
                    .unwrap_or(Value::Null);
                return Ok(json!({
                    "data": { "Media": { "mediaListEntry": entry } }
                }));
            }

            Err(format!("unexpected query: {}", query))
        })
    }
}

/// Canned anime catalog.
pub struct StubLookup {
    entries: HashMap<i64, MediaEntry>,
    failing: bool,
}

impl StubLookup {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), failing: false }
    }

    pub fn withEntry(mut self, id: i64, title: &str, coverImage: &str) -> Self {
        self.entries.insert(
            id,
            MediaEntry { title: title.to_string(), coverImage: coverImage.to_string() },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

impl AnimeLookup for StubLookup {
    fn getEntry(&self, mediaId: i64) -> BoxFuture<'_, Result<Option<MediaEntry>, String>> {
        Box::pin(async move {
            if self.failing {
                return Err("catalog offline".to_string());
            }
            Ok(self.entries.get(&mediaId).cloned())
        })
    }
}

/// Everything a Plugin test needs, with handles kept for inspection.
pub struct TestHarness {
    pub plugin: Arc<Plugin>,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<FakeTransport>,
}

pub fn harness(mode: &str) -> TestHarness {
    harnessWith(mode, Some("token"), StubLookup::new())
}

pub fn harnessWith(mode: &str, token: Option<&str>, lookup: StubLookup) -> TestHarness {
    // Capture logs per test; repeat initialization is a no-op.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(FakeTransport::new());
    let config = PluginConfig {
        noteMode: mode.to_string(),
        token: token.map(str::to_string),
    };
    let plugin = initPlugin(config, store.clone(), transport.clone(), Arc::new(lookup));
    TestHarness { plugin, store, transport }
}
