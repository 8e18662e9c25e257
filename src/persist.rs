// src/persist.rs - Snapshot persistence adapter

//! Thin adapter between the engines' mutation APIs and the storage
//! provider. Engines call `save` after each mutation and `load` once at
//! startup; persistence is never wired implicitly into setters.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::platform::StorageArc;

/// Serializes one engine's state snapshot to a fixed storage key.
///
/// A missing or unreadable stored value is policy, not failure: `load`
/// returns `None` and the engine starts empty.
#[derive(Clone)]
pub struct SnapshotStore {
    storage: StorageArc,
    key: String,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore").field("key", &self.key).finish()
    }
}

impl SnapshotStore {
    pub fn new(storage: StorageArc, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Storage key this snapshot is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persists a snapshot, replacing whatever was stored. Last write wins.
    pub async fn save<T: Serialize>(&self, snapshot: &T) -> Result<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        self.storage.set(&self.key, &bytes).await
    }

    /// Loads the stored snapshot. Missing or corrupt values are treated as
    /// empty state and logged, never surfaced as errors.
    pub async fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let bytes = match self.storage.get(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to read stored snapshot, starting empty");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "stored snapshot is corrupt, starting empty");
                None
            }
        }
    }

    /// Removes the stored snapshot
    pub async fn discard(&self) -> Result<()> {
        self.storage.delete(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::platform::MemoryStorage;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        items: Vec<String>,
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let storage: StorageArc = Arc::new(MemoryStorage::new());
        let store = SnapshotStore::new(storage, "cart-storage");

        let snapshot = Snapshot {
            items: vec!["1".to_string(), "2".to_string()],
        };
        store.save(&snapshot).await.unwrap();

        let loaded: Snapshot = store.load().await.unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let storage: StorageArc = Arc::new(MemoryStorage::new());
        let store = SnapshotStore::new(storage, "comparison-storage");
        assert_eq!(store.load::<Snapshot>().await, None);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_none() {
        let storage: StorageArc = Arc::new(MemoryStorage::new());
        storage.set("cart-storage", b"not json at all").await.unwrap();

        let store = SnapshotStore::new(storage, "cart-storage");
        assert_eq!(store.load::<Snapshot>().await, None);
    }
}
