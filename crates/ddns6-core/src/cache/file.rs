// # File Cache Store
//
// File-based implementation of CacheStore.
//
// ## Purpose
//
// Keeps the provider zone id and record id across runs so that a run whose
// address changed can go straight to the update call.
//
// ## Durability
//
// - Atomic writes: the new record is written to `<path>.tmp`, then renamed
//   over the cache file, so a crash mid-write leaves the old record intact
// - Missing file: reads as "nothing cached"
// - Corrupt file: reads as an error; the engine logs it and rediscovers,
//   and the next successful lookup overwrites the file

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::cache_store::{CacheRecord, CacheStore};

/// File-based cache store
///
/// # Example
///
/// ```rust,no_run
/// use ddns6_core::cache::FileCacheStore;
/// use ddns6_core::traits::{CacheRecord, CacheStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCacheStore::new("/var/lib/ddns6/cache.json");
///
///     let record = CacheRecord::new("api.example.com", Some("zone".into()), Some("record".into()));
///     store.write(&record).await?;
///
///     assert_eq!(store.read().await?, Some(record));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    /// Create a store backed by the file at `path`
    ///
    /// Nothing is touched on disk until the first read or write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn read(&self) -> Result<Option<CacheRecord>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::filesystem(format!(
                    "Failed to read cache file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let record: CacheRecord = serde_json::from_str(&content).map_err(|e| {
            Error::filesystem(format!(
                "Failed to parse cache file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(record))
    }

    async fn write(&self, record: &CacheRecord) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::filesystem(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string(record)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::filesystem(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::filesystem(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::filesystem(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::filesystem(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache written to file: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("cache.json"));

        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = FileCacheStore::new(&path);

        let record = CacheRecord::new(
            "api.example.com",
            Some("zone-1".to_string()),
            Some("record-1".to_string()),
        );
        store.write(&record).await.unwrap();

        assert!(path.exists());
        assert!(!store.temp_path().exists(), "temp file should be renamed away");

        // A fresh instance sees the same record
        let store2 = FileCacheStore::new(&path);
        assert_eq!(store2.read().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = FileCacheStore::new(&path);

        store
            .write(&CacheRecord::cleared("api.example.com"))
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "domain": "api.example.com",
                "zone_id": null,
                "record_id": null,
            })
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, b"corrupted json data").await.unwrap();

        let store = FileCacheStore::new(&path);
        assert!(matches!(store.read().await, Err(Error::Filesystem(_))));

        // Overwriting repairs it
        let record = CacheRecord::cleared("api.example.com");
        store.write(&record).await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let store = FileCacheStore::new(&path);

        store
            .write(&CacheRecord::cleared("api.example.com"))
            .await
            .unwrap();
        assert!(path.exists());
    }
}
