use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;

/// Durable per-client key/value store backed by a single JSON file.
///
/// A missing file reads as empty storage. Writes rewrite the whole file.
pub struct LocalStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage for one client under `root/clients/{client}.json`.
    pub fn for_client(root: &Path, client: &str) -> Self {
        Self::new(root.join("clients").join(format!("{}.json", client)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(entries)?).await?;
        Ok(())
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await?;
        debug!(path = ?self.path, key, "local storage updated");
        Ok(())
    }

    /// Return the value under `key`, or store and return `make()` if there is
    /// none. Read and write happen under one lock acquisition.
    pub async fn get_or_insert_with<F>(&self, key: &str, make: F) -> Result<String, StorageError>
    where
        F: FnOnce() -> String,
    {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if let Some(value) = entries.get(key).filter(|v| !v.is_empty()) {
            return Ok(value.clone());
        }
        let value = make();
        entries.insert(key.to_string(), value.clone());
        self.write_all(&entries).await?;
        debug!(path = ?self.path, key, "local storage initialized key");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get_item("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::for_client(dir.path(), "1234");
        assert!(storage.path().ends_with("clients/1234.json"));

        storage.set_item("a", "1").await.unwrap();
        storage.set_item("b", "2").await.unwrap();
        assert_eq!(storage.get_item("a").await.unwrap().as_deref(), Some("1"));

        storage.set_item("a", "3").await.unwrap();
        assert_eq!(storage.get_item("a").await.unwrap().as_deref(), Some("3"));
        assert_eq!(storage.get_item("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_get_or_insert_with_keeps_existing_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("client.json"));
        let first = storage.get_or_insert_with("k", || "one".to_string()).await.unwrap();
        let second = storage.get_or_insert_with("k", || "two".to_string()).await.unwrap();
        assert_eq!(first, "one");
        assert_eq!(second, "one");
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        LocalStorage::new(&path).set_item("k", "v").await.unwrap();
        let reopened = LocalStorage::new(&path);
        assert_eq!(reopened.get_item("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = LocalStorage::new(&path).get_item("k").await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }
}
