//! Durable key/value storage for client-local state.
//!
//! Stands in for the browser's local storage: opaque JSON strings under
//! well-known keys. Corrupt or unreadable data is treated as absent,
//! never as an error - a broken cart file must not take the store down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key for the persisted cart.
pub const CART_KEY: &str = "varmina_cart";
/// Storage key for the dark-mode preference.
pub const DARK_MODE_KEY: &str = "varmina_dark_mode";

/// Durable key/value storage.
///
/// `set` is infallible by contract: implementations swallow write errors
/// (logging them) because no cart mutation should ever fail on I/O.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value; absent and unreadable are the same thing.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: &str);
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.values.lock() {
            map.insert(key.to_owned(), value.to_owned());
        }
    }
}

/// File-backed storage: one JSON object holding every key.
///
/// Loaded once at construction; every `set` rewrites the file. Writes go
/// through a temp file + rename so a crash mid-write leaves the previous
/// snapshot intact.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or start) the storage file at `path`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load_map(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn persist(&self, map: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(map) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize key/value storage");
                return;
            }
        };
        let tmp = self.path.with_extension("tmp");
        let result = std::fs::write(&tmp, json).and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to persist key/value storage");
        }
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        let Ok(mut map) = self.values.lock() else {
            return;
        };
        map.insert(key.to_owned(), value.to_owned());
        self.persist(&map);
    }
}

/// Read and parse the storage file; anything unreadable is an empty map.
fn load_map(path: &Path) -> HashMap<String, String> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "corrupt key/value storage, starting empty");
            HashMap::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.get(CART_KEY).is_none());
        storage.set(CART_KEY, "[]");
        assert_eq!(storage.get(CART_KEY).unwrap(), "[]");
    }

    #[test]
    fn file_storage_round_trips() {
        let dir = std::env::temp_dir().join(format!("varmina-kv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");

        let storage = JsonFileStorage::open(&path);
        storage.set(DARK_MODE_KEY, "true");
        drop(storage);

        let reopened = JsonFileStorage::open(&path);
        assert_eq!(reopened.get(DARK_MODE_KEY).unwrap(), "true");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = std::env::temp_dir().join(format!("varmina-kv-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let storage = JsonFileStorage::open(&path);
        assert!(storage.get(CART_KEY).is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
