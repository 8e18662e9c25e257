// src/platform/memory.rs - In-memory storage provider

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::platform::storage::StorageProvider;

/// Volatile key-value store. Used in tests and anywhere a session does not
/// need its cart to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let storage = MemoryStorage::new();

        storage.set("cart-storage", b"{}").await.unwrap();
        assert_eq!(storage.get("cart-storage").await.unwrap(), Some(b"{}".to_vec()));

        storage.delete("cart-storage").await.unwrap();
        assert_eq!(storage.get("cart-storage").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_keys_by_prefix() {
        let storage = MemoryStorage::new();
        storage.set("cart-storage", b"a").await.unwrap();
        storage.set("comparison-storage", b"b").await.unwrap();

        let keys = storage.list_keys("cart").await.unwrap();
        assert_eq!(keys, vec!["cart-storage".to_string()]);
    }
}
