// Key/value-backed note storage
// The host store has no partial-update primitive, so the whole note map is
// read-modify-written under a single key. Last-writer-wins at whole-map
// granularity is accepted (see DESIGN.md).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::host::PersistentStore;

/// The plugin's single persistent key.
pub const STORAGE_KEY: &str = "anime-notes";

// ============================================
// VALUE NORMALIZATION
// ============================================

/// Collapse the literal two-character empty-quote artifact to an empty note.
pub fn normalizeText(text: &str) -> String {
    if text == "\"\"" {
        String::new()
    } else {
        text.to_string()
    }
}

/// Coerce a stored JSON value to note text.
/// Legacy write paths left nulls and non-string values in the map.
pub fn normalizeValue(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => normalizeText(text),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

// ============================================
// NOTE REPOSITORY
// ============================================

/// Local note store: media id -> note text, behind the opaque host store.
pub struct NoteRepository {
    store: Arc<dyn PersistentStore>,
}

impl NoteRepository {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Load the raw persisted map. Anything that is not a JSON object is
    /// treated as an empty map.
    fn loadRaw(&self) -> serde_json::Map<String, Value> {
        match self.store.get(STORAGE_KEY) {
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!("[NoteRepository::loadRaw] stored notes are not an object: {}", other);
                serde_json::Map::new()
            }
            None => serde_json::Map::new(),
        }
    }

    fn save(&self, map: serde_json::Map<String, Value>) {
        self.store.set(STORAGE_KEY, Value::Object(map));
    }

    /// Normalized text for `id`, empty string when absent.
    pub fn read(&self, id: i64) -> String {
        self.loadRaw()
            .get(&id.to_string())
            .map(normalizeValue)
            .unwrap_or_default()
    }

    /// Full normalized map. Non-numeric keys are legacy artifacts and skipped.
    pub fn readAll(&self) -> HashMap<i64, String> {
        let mut notes = HashMap::new();
        for (key, value) in self.loadRaw() {
            match key.parse::<i64>() {
                Ok(id) => {
                    notes.insert(id, normalizeValue(&value));
                }
                Err(_) => warn!("[NoteRepository::readAll] skipping non-numeric key {:?}", key),
            }
        }
        notes
    }

    pub fn write(&self, id: i64, text: &str) {
        let mut map = self.loadRaw();
        map.insert(id.to_string(), Value::String(text.to_string()));
        self.save(map);
    }

    pub fn delete(&self, id: i64) {
        let mut map = self.loadRaw();
        map.remove(&id.to_string());
        self.save(map);
    }

    /// Merge a remote map in, remote wins on conflict.
    pub fn merge(&self, incoming: &HashMap<i64, String>) {
        let mut map = self.loadRaw();
        for (id, text) in incoming {
            map.insert(id.to_string(), Value::String(text.clone()));
        }
        self.save(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryStore;
    use serde_json::json;

    fn repo() -> (NoteRepository, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (NoteRepository::new(store.clone()), store)
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["", "\"\"", "watch ep 5", "  spaced  "] {
            let once = normalizeText(raw);
            assert_eq!(normalizeText(&once), once);
        }
        assert_eq!(normalizeText("\"\""), "");
        assert_eq!(normalizeValue(&Value::Null), "");
    }

    #[test]
    fn test_normalize_coerces_non_strings() {
        assert_eq!(normalizeValue(&json!(42)), "42");
        assert_eq!(normalizeValue(&json!(true)), "true");
        assert_eq!(normalizeValue(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn test_read_missing_is_empty() {
        let (repo, _) = repo();
        assert_eq!(repo.read(42), "");
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let (repo, _) = repo();
        repo.write(42, "watch ep 5");
        assert_eq!(repo.read(42), "watch ep 5");

        repo.write(42, "done");
        assert_eq!(repo.read(42), "done");
    }

    #[test]
    fn test_delete_removes_only_that_id() {
        let (repo, _) = repo();
        repo.write(1, "a");
        repo.write(2, "b");
        repo.delete(1);
        assert_eq!(repo.read(1), "");
        assert_eq!(repo.read(2), "b");
    }

    #[test]
    fn test_read_all_normalizes_legacy_values() {
        let (repo, store) = repo();
        store.set(
            STORAGE_KEY,
            json!({
                "1": "plain",
                "2": "\"\"",
                "3": null,
                "4": 7,
                "not-a-number": "ignored"
            }),
        );

        let all = repo.readAll();
        assert_eq!(all.len(), 4);
        assert_eq!(all[&1], "plain");
        assert_eq!(all[&2], "");
        assert_eq!(all[&3], "");
        assert_eq!(all[&4], "7");
    }

    #[test]
    fn test_non_object_store_value_reads_as_empty() {
        let (repo, store) = repo();
        store.set(STORAGE_KEY, json!("corrupted"));
        assert!(repo.readAll().is_empty());
    }

    #[test]
    fn test_merge_remote_wins_on_conflict() {
        let (repo, _) = repo();
        repo.write(1, "old");
        let incoming = HashMap::from([(1, "new".to_string()), (2, "x".to_string())]);
        repo.merge(&incoming);

        let all = repo.readAll();
        assert_eq!(all, HashMap::from([(1, "new".to_string()), (2, "x".to_string())]));
    }
}
