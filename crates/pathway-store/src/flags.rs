//! Durable boolean flags
//!
//! The board persists exactly one flag (whether the user has seen the
//! first-run Target explanation), but the contract is keyed so a single file
//! or table can hold several. Semantics: `get` defaults to `false`, `set` is
//! flushed before it returns, last write wins.

use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Durable key/boolean store
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Read a flag, `false` when never written
    async fn get(&self, key: &str) -> Result<bool, StoreError>;

    /// Write a flag and flush it
    async fn set(&self, key: &str, value: bool) -> Result<(), StoreError>;
}

/// Process-local flag store
#[derive(Debug, Default)]
pub struct InMemoryFlagStore {
    flags: Mutex<BTreeMap<String, bool>>,
    fail_writes: Mutex<bool>,
}

impl InMemoryFlagStore {
    /// Create empty flag store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store with one flag already set
    #[must_use]
    pub fn with_flag(key: impl Into<String>, value: bool) -> Self {
        let store = Self::new();
        store.flags.lock().insert(key.into(), value);
        store
    }

    /// Make subsequent writes fail with `Persistence`
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Read without going through the async contract
    #[must_use]
    pub fn peek(&self, key: &str) -> bool {
        self.flags.lock().get(key).copied().unwrap_or(false)
    }
}

#[async_trait]
impl FlagStore for InMemoryFlagStore {
    async fn get(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: bool) -> Result<(), StoreError> {
        if *self.fail_writes.lock() {
            return Err(StoreError::Persistence(format!("write of {key} rejected")));
        }
        self.flags.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Flags stored as a JSON object on disk
///
/// The file is created on first write; a missing file reads as all-false.
#[derive(Debug, Clone)]
pub struct JsonFileFlagStore {
    path: PathBuf,
}

impl JsonFileFlagStore {
    /// Create store backed by `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, bool>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl FlagStore for JsonFileFlagStore {
    async fn get(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.load().await?.get(key).copied().unwrap_or(false))
    }

    async fn set(&self, key: &str, value: bool) -> Result<(), StoreError> {
        let mut flags = self.load().await?;
        flags.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(&flags)?;
        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(key, value, path = %self.path.display(), "flag persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_defaults_to_false() {
        let flags = InMemoryFlagStore::new();
        assert!(!flags.get("seen").await.unwrap());

        flags.set("seen", true).await.unwrap();
        assert!(flags.get("seen").await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_write_failure_keeps_value() {
        let flags = InMemoryFlagStore::new();
        flags.fail_writes(true);

        let result = flags.set("seen", true).await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert!(!flags.peek("seen"));
    }

    #[tokio::test]
    async fn json_file_missing_reads_false() {
        let dir = tempfile::tempdir().unwrap();
        let flags = JsonFileFlagStore::new(dir.path().join("flags.json"));

        assert!(!flags.get("hasSeenTargetExplanation").await.unwrap());
    }

    #[tokio::test]
    async fn json_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("flags.json");

        JsonFileFlagStore::new(&path)
            .set("hasSeenTargetExplanation", true)
            .await
            .unwrap();

        let reopened = JsonFileFlagStore::new(&path);
        assert!(reopened.get("hasSeenTargetExplanation").await.unwrap());
        assert!(!reopened.get("other").await.unwrap());
    }

    #[tokio::test]
    async fn json_file_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let flags = JsonFileFlagStore::new(dir.path().join("flags.json"));

        flags.set("a", true).await.unwrap();
        flags.set("b", true).await.unwrap();
        flags.set("a", false).await.unwrap();

        assert!(!flags.get("a").await.unwrap());
        assert!(flags.get("b").await.unwrap());
    }

    #[tokio::test]
    async fn json_file_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");

        JsonFileFlagStore::new(&path).set("seen", true).await.unwrap();

        assert!(!path.with_extension("tmp").exists());
        let on_disk: BTreeMap<String, bool> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("seen"), Some(&true));
    }

    #[tokio::test]
    async fn json_file_corrupt_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        std::fs::write(&path, b"not json").unwrap();

        let result = JsonFileFlagStore::new(&path).get("a").await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
    }
}
