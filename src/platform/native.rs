// src/platform/native.rs - File-backed storage provider

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{Error, Result, StorageOperation};
use crate::platform::storage::StorageProvider;

/// Durable key-value store holding one file per key beneath a data
/// directory. Keys are fixed, URL-safe identifiers (`cart-storage`,
/// `comparison-storage`), so they are used as file names directly.
#[derive(Debug)]
pub struct NativeStorage {
    base_path: PathBuf,
}

impl NativeStorage {
    /// Creates a store rooted at the platform data directory
    pub fn new() -> Result<Self> {
        let base_path = dirs::data_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default().join("data"))
            .join("seftec-store");

        Ok(Self { base_path })
    }

    /// Creates a store rooted at an explicit directory
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve_key(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    async fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            Error::storage(
                self.base_path.to_string_lossy(),
                StorageOperation::Set,
                format!("failed to create storage directory: {}", e),
            )
        })
    }
}

#[async_trait]
impl StorageProvider for NativeStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.resolve_key(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(
                key,
                StorageOperation::Get,
                format!("failed to read stored value: {}", e),
            )),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.ensure_base_dir().await?;
        fs::write(self.resolve_key(key), value).await.map_err(|e| {
            Error::storage(
                key,
                StorageOperation::Set,
                format!("failed to write stored value: {}", e),
            )
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.resolve_key(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(
                key,
                StorageOperation::Delete,
                format!("failed to delete stored value: {}", e),
            )),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::storage(
                    prefix,
                    StorageOperation::List,
                    format!("failed to read storage directory: {}", e),
                ))
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            Error::storage(
                prefix,
                StorageOperation::List,
                format!("failed to read storage entry: {}", e),
            )
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(prefix) {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        for key in self.list_keys("").await? {
            self.delete(&key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = NativeStorage::with_base_path(dir.path());

        storage.set("cart-storage", b"{\"items\":[]}").await.unwrap();
        assert_eq!(
            storage.get("cart-storage").await.unwrap(),
            Some(b"{\"items\":[]}".to_vec())
        );

        storage.clear().await.unwrap();
        assert_eq!(storage.get("cart-storage").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = NativeStorage::with_base_path(dir.path());
        assert_eq!(storage.get("comparison-storage").await.unwrap(), None);
    }
}
