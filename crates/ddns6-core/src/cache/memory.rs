// # Memory Cache Store
//
// In-memory implementation of CacheStore.
//
// Nothing survives the process, so every run with a changed address pays
// for the zone and record lookups again. Useful for embedding and tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::cache_store::{CacheRecord, CacheStore};

/// In-memory cache store
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<Option<CacheRecord>>>,
}

impl MemoryCacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `record`
    pub fn with_record(record: CacheRecord) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(record))),
        }
    }

    /// Peek at the stored record
    pub async fn snapshot(&self) -> Option<CacheRecord> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self) -> Result<Option<CacheRecord>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn write(&self, record: &CacheRecord) -> Result<(), Error> {
        *self.inner.write().await = Some(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.read().await.unwrap(), None);

        let record = CacheRecord::new("api.example.com", Some("z".into()), Some("r".into()));
        store.write(&record).await.unwrap();

        // Clones see the write
        let clone = store.clone();
        assert_eq!(clone.read().await.unwrap(), Some(record.clone()));
        assert_eq!(clone.snapshot().await, Some(record));
    }
}
