//! Persisted key/value backends for lock sessions.
//!
//! The session store needs nothing more than string get/set/remove: one
//! well-known key holds the index, one key per session holds the record.
//! An in-memory map serves tests and short-lived tools; a directory of
//! files serves long-running deployments.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::Result;

/// String key/value persistence consumed by the lock-session store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. Missing keys yield `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile backend backed by a map.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One file per key under a root directory. The directory is created on
/// first write.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize(key))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Keys become file names, so anything outside the portable set is
/// replaced and the dot directories are ruled out.
fn sanitize(key: &str) -> String {
    let name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name == "." || name == ".." {
        "_".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_values() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("missing").await.expect("get"), None);

        store.set("a", "1").await.expect("set");
        store.set("a", "2").await.expect("overwrite");
        assert_eq!(store.get("a").await.expect("get").as_deref(), Some("2"));

        store.remove("a").await.expect("remove");
        store.remove("a").await.expect("remove twice");
        assert_eq!(store.get("a").await.expect("get"), None);
    }

    #[tokio::test]
    async fn file_store_round_trips_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileKeyValueStore::new(dir.path().join("locks"));

        assert_eq!(store.get("missing").await.expect("get"), None);
        store
            .set("WFSTFeatureLock-1-abc-0", "{\"id\":\"x\"}")
            .await
            .expect("set");
        assert_eq!(
            store
                .get("WFSTFeatureLock-1-abc-0")
                .await
                .expect("get")
                .as_deref(),
            Some("{\"id\":\"x\"}")
        );

        store.remove("WFSTFeatureLock-1-abc-0").await.expect("remove");
        store.remove("WFSTFeatureLock-1-abc-0").await.expect("remove twice");
        assert_eq!(store.get("WFSTFeatureLock-1-abc-0").await.expect("get"), None);
    }

    #[tokio::test]
    async fn hostile_keys_stay_inside_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileKeyValueStore::new(dir.path());

        store.set("../escape/attempt", "v").await.expect("set");
        assert_eq!(
            store.get("../escape/attempt").await.expect("get").as_deref(),
            Some("v")
        );
        assert!(!dir.path().join("..").join("escape").exists());
    }
}
