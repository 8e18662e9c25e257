// src/platform/storage.rs

use std::sync::Arc;

use crate::error::Result;

pub type DynStorage = dyn StorageProvider + Send + Sync;

pub type StorageArc = Arc<DynStorage>;

/// Storage operations (key-value)
///
/// The storefront persists its cart and comparison snapshots through this
/// seam; the browser build backs it with local storage, the native build
/// with files under the data directory.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
    async fn clear(&self) -> Result<()>;
}
