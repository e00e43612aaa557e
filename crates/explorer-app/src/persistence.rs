//! Per-form snapshots of raw input values
//!
//! A snapshot is a JSON object of the form's literal values stored under
//! the form key. Loading merges it over the schema defaults; anything that
//! cannot be read is logged and treated as absent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use explorer_core::prelude::*;
use explorer_core::{FormKey, FormValue, FormValueMap, ParameterSchema};
use serde_json::{Map, Value};

/// String key → string value storage
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// Process-local store used by tests and `--ephemeral` runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::store("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_local_dir>/sdk-explorer/forms`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("sdk-explorer").join("forms"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Keep `[A-Za-z0-9._-]`, percent-encode every other byte
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => stem.push(byte as char),
            other => stem.push_str(&format!("%{other:02X}")),
        }
    }
    if stem.starts_with('.') {
        stem.replace_range(0..1, "%2E");
    }
    stem
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| Error::store(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::store(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(key);
        let temp_path = self.dir.join(format!(".{}.tmp", file_stem(key)));

        // Atomic write: write to temp, then rename
        std::fs::write(&temp_path, value)
            .map_err(|e| Error::store(format!("Failed to write temp file: {}", e)))?;
        std::fs::rename(&temp_path, &path)
            .map_err(|e| Error::store(format!("Failed to rename temp file: {}", e)))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::store(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Snapshot access for method forms
#[derive(Clone)]
pub struct PersistedFormState {
    store: Arc<dyn KeyValueStore>,
}

impl PersistedFormState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Schema defaults overlaid with the stored snapshot, key by key
    ///
    /// Never fails: read errors, unparseable snapshots and values whose type
    /// does not fit the parameter fall back to defaults.
    pub fn load(&self, key: &FormKey, schema: &ParameterSchema) -> FormValueMap {
        let mut values = schema.defaults();

        let raw = match self.store.get(&key.storage_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return values,
            Err(e) => {
                warn!("Ignoring unreadable snapshot for {}: {}", key, e);
                return values;
            }
        };

        let stored = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!("Ignoring snapshot for {}: expected an object, found {}", key, other);
                return values;
            }
            Err(e) => {
                warn!("Ignoring corrupt snapshot for {}: {}", key, e);
                return values;
            }
        };

        for descriptor in schema {
            let Some(entry) = stored.get(&descriptor.name) else {
                continue;
            };
            match FormValue::from_json(descriptor.kind, entry) {
                Some(value) => {
                    values.insert(descriptor.name.clone(), value);
                }
                None => debug!(
                    "Stored '{}' for {} does not fit a {} parameter, using default",
                    descriptor.name, key, descriptor.kind
                ),
            }
        }
        values
    }

    /// Overwrite the snapshot with `values` in a single store write
    pub fn save(&self, key: &FormKey, values: &FormValueMap) -> Result<()> {
        let snapshot: Map<String, Value> = values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        let content = serde_json::to_string(&Value::Object(snapshot))?;
        self.store.set(&key.storage_key(), &content)?;
        info!("Saved form values for {}", key);
        Ok(())
    }

    /// Remove the snapshot; in-memory form values are untouched
    pub fn clear(&self, key: &FormKey) -> Result<()> {
        self.store.delete(&key.storage_key())?;
        info!("Cleared stored values for {}", key);
        Ok(())
    }
}

impl std::fmt::Debug for PersistedFormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedFormState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use explorer_core::{Attachment, ParameterDescriptor as P};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    fn ab_schema() -> ParameterSchema {
        ParameterSchema::new(vec![P::number("a").default(1), P::number("b").default(2)]).unwrap()
    }

    fn key() -> FormKey {
        FormKey::new("im", "sendMessage")
    }

    fn numbers(pairs: &[(&str, i64)]) -> FormValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FormValue::number(*v)))
            .collect()
    }

    #[test]
    fn test_load_merges_snapshot_over_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set("im.sendMessage", r#"{"a": 9}"#).unwrap();
        let persisted = PersistedFormState::new(store);

        assert_eq!(persisted.load(&key(), &ab_schema()), numbers(&[("a", 9), ("b", 2)]));
    }

    #[test]
    fn test_corrupt_snapshot_yields_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set("im.sendMessage", "{not json").unwrap();
        let persisted = PersistedFormState::new(store);

        assert_eq!(persisted.load(&key(), &ab_schema()), numbers(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_non_object_and_mistyped_entries_fall_back() {
        let store = Arc::new(MemoryStore::new());
        let persisted = PersistedFormState::new(store.clone());

        store.set("im.sendMessage", "[1, 2]").unwrap();
        assert_eq!(persisted.load(&key(), &ab_schema()), numbers(&[("a", 1), ("b", 2)]));

        store
            .set("im.sendMessage", r#"{"a": true, "b": 5, "zzz": "ignored"}"#)
            .unwrap();
        let loaded = persisted.load(&key(), &ab_schema());
        assert_eq!(loaded, numbers(&[("a", 1), ("b", 5)]));
        assert!(!loaded.contains_key("zzz"));
    }

    #[test]
    fn test_read_error_is_treated_as_absent() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .with(eq("im.sendMessage"))
            .times(1)
            .returning(|_| Err(Error::store("disk on fire")));
        let persisted = PersistedFormState::new(Arc::new(store));

        assert_eq!(persisted.load(&key(), &ab_schema()), numbers(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_save_writes_whole_snapshot_once() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_set()
            .withf(|k, v| k == "im.sendMessage" && v == r#"{"a":3,"b":4}"#)
            .times(1)
            .returning(|_, _| Ok(()));
        let persisted = PersistedFormState::new(Arc::new(store));

        persisted.save(&key(), &numbers(&[("a", 3), ("b", 4)])).unwrap();
    }

    #[test]
    fn test_save_then_load_round_trips_raw_text() {
        let schema = ParameterSchema::new(vec![
            P::structured("payload"),
            P::number("count"),
            P::binary("file"),
        ])
        .unwrap();
        let persisted = PersistedFormState::in_memory();
        let mut values = schema.defaults();
        values.insert("payload".into(), FormValue::text("{broken"));
        values.insert("count".into(), FormValue::text("12x"));
        values.insert(
            "file".into(),
            FormValue::Attachments(vec![Attachment {
                name: "a.txt".into(),
                path: "/tmp/a.txt".into(),
                size: 1,
            }]),
        );

        persisted.save(&key(), &values).unwrap();
        assert_eq!(persisted.load(&key(), &schema), values);
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let persisted = PersistedFormState::in_memory();
        persisted.save(&key(), &numbers(&[("a", 7)])).unwrap();
        persisted.clear(&key()).unwrap();

        assert_eq!(persisted.load(&key(), &ab_schema()), numbers(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_file_store_round_trip_and_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("forms"));

        assert_eq!(store.get("im.send").unwrap(), None);
        store.set("im.send", "{\"a\":1}").unwrap();
        store.set("im.send", "{\"a\":2}").unwrap();
        assert_eq!(store.get("im.send").unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(store.path_for("im.send").ends_with("im.send.json"));

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        store.delete("im.send").unwrap();
        store.delete("im.send").unwrap();
        assert_eq!(store.get("im.send").unwrap(), None);
    }

    #[test]
    fn test_file_names_are_sanitized() {
        assert_eq!(file_stem("im.sendMessage"), "im.sendMessage");
        assert_eq!(file_stem("a/b c"), "a%2Fb%20c");
        assert_eq!(file_stem("../x"), "%2E.%2Fx");
    }
}
