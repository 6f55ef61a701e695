//! Persistent string key-value storage.
//!
//! The widget keeps exactly two entries: the recent-search list and the API
//! key. Absence is "no data"; any I/O or parse problem is reported as
//! [`WidgetError::StorageUnavailable`] and callers degrade instead of failing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::WidgetError;

/// Entry holding the recent-search list as a JSON array of strings.
pub const RECENT_SEARCHES_KEY: &str = "weatherSearches";

/// Entry holding the raw API key.
pub const API_KEY_KEY: &str = "OWM_API_KEY";

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, WidgetError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), WidgetError>;
    async fn remove(&self, key: &str) -> Result<(), WidgetError>;
}

/// All entries in one pretty-printed JSON object on disk.
///
/// Every operation holds `io_lock` across its read-modify-write, so
/// overlapping writers (and clones of the same store) never drop each
/// other's entries.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    io_lock: Arc<AsyncMutex<()>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), io_lock: Arc::default() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, WidgetError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(unavailable(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| unavailable(&self.path, e))
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), WidgetError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable(parent, e))?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| unavailable(&self.path, e))?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| unavailable(&self.path, e))
    }
}

fn unavailable(path: &std::path::Path, err: impl std::fmt::Display) -> WidgetError {
    WidgetError::StorageUnavailable(format!("{}: {err}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
        let _guard = self.io_lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), WidgetError> {
        let _guard = self.io_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), WidgetError> {
        let _guard = self.io_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

/// Process-local store. Used by `--ephemeral` sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, like storage blocked by the host.
    pub fn unavailable() -> Self {
        Self { entries: Mutex::default(), unavailable: true }
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.lock().insert(key.to_string(), value.to_string());
        self
    }

    /// Synchronous peek, bypassing the availability flag.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn check(&self) -> Result<(), WidgetError> {
        if self.unavailable {
            Err(WidgetError::StorageUnavailable("storage access denied".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), WidgetError> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), WidgetError> {
        self.check()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("storage.json"));

        assert_eq!(store.get(API_KEY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileStore::new(&path).set(API_KEY_KEY, "abcdef0123456789").await.unwrap();
        FileStore::new(&path).set(RECENT_SEARCHES_KEY, r#"["Paris"]"#).await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(API_KEY_KEY).await.unwrap().as_deref(), Some("abcdef0123456789"));
        assert_eq!(reopened.get(RECENT_SEARCHES_KEY).await.unwrap().as_deref(), Some(r#"["Paris"]"#));

        reopened.remove(API_KEY_KEY).await.unwrap();
        assert_eq!(FileStore::new(&path).get(API_KEY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_overlapping_writes_keep_both_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        for round in 0..20 {
            let store = FileStore::new(&path);
            let shared = store.clone();
            let recent = format!(r#"["City {round}"]"#);
            let (a, b) = tokio::join!(
                store.set(API_KEY_KEY, "abcdef0123456789"),
                shared.set(RECENT_SEARCHES_KEY, &recent),
            );
            a.unwrap();
            b.unwrap();

            let reopened = FileStore::new(&path);
            assert_eq!(reopened.get(API_KEY_KEY).await.unwrap().as_deref(), Some("abcdef0123456789"));
            assert_eq!(reopened.get(RECENT_SEARCHES_KEY).await.unwrap(), Some(recent));

            std::fs::remove_file(&path).unwrap();
        }
    }

    #[tokio::test]
    async fn file_store_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::new(&path).get(API_KEY_KEY).await.unwrap_err();
        assert!(matches!(err, WidgetError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn memory_store_unavailable_fails_every_operation() {
        let store = MemoryStore::unavailable();

        assert!(store.get(API_KEY_KEY).await.is_err());
        assert!(store.set(API_KEY_KEY, "x").await.is_err());
        assert!(store.remove(API_KEY_KEY).await.is_err());
    }
}
