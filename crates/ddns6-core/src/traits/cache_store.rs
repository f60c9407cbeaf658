// # Cache Store Trait
//
// Defines the interface for the provider id cache.
//
// ## Purpose
//
// Zone and record ids are stable on the provider side, so looking them up on
// every run wastes two API calls. The cache remembers them between runs.
// It is the only durable state ddns6 keeps.
//
// ## File Format
//
// ```json
// { "domain": "api.example.com", "zone_id": "023e105f...", "record_id": "372e6795..." }
// ```
//
// A cleared cache keeps the domain and nulls both ids.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persisted provider identifiers for the managed domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The fully-qualified domain the ids belong to
    #[serde(default)]
    pub domain: String,
    /// Provider zone id
    #[serde(default)]
    pub zone_id: Option<String>,
    /// Provider record id of the AAAA record
    #[serde(default)]
    pub record_id: Option<String>,
}

impl CacheRecord {
    /// Create a cache record
    pub fn new(
        domain: impl Into<String>,
        zone_id: Option<String>,
        record_id: Option<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            zone_id,
            record_id,
        }
    }

    /// Create a cleared cache record (domain kept, ids dropped)
    pub fn cleared(domain: impl Into<String>) -> Self {
        Self::new(domain, None, None)
    }

    /// The cached ids, if this record was written for `domain`
    ///
    /// A record written for any other domain is stale configuration and
    /// yields `(None, None)` regardless of its ids.
    pub fn ids_for(&self, domain: &str) -> (Option<String>, Option<String>) {
        if self.domain == domain {
            (self.zone_id.clone(), self.record_id.clone())
        } else {
            (None, None)
        }
    }
}

/// Trait for cache store implementations
///
/// Stores hold at most one [`CacheRecord`]. Every write replaces it and must
/// be durable before returning; there is no separate flush.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the stored record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(CacheRecord))`: A record was stored
    /// - `Ok(None)`: Nothing stored yet
    /// - `Err(Error)`: The store exists but could not be read or parsed
    async fn read(&self) -> Result<Option<CacheRecord>, crate::Error>;

    /// Replace the stored record
    async fn write(&self, record: &CacheRecord) -> Result<(), crate::Error>;
}
