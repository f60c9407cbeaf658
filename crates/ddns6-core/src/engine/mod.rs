//! Reconciliation engine
//!
//! The SyncEngine performs one reconciliation pass per process invocation:
//! - Discover the expected address via IpSource
//! - Resolve the recorded address via RecordResolver
//! - Resolve zone and record ids (CacheStore first, DnsProvider on a miss)
//! - Create or update the AAAA record via DnsProvider
//! - Persist ids after discovery and creation, clear them after a failed update
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  ┌────────────────┐
//! │  IpSource   │  │ RecordResolver │
//! │ (expected)  │  │   (recorded)   │
//! └─────────────┘  └────────────────┘
//!        │                 │
//!        └────────┬────────┘
//!                 ▼
//!          ┌──────────────┐
//!          │  SyncEngine  │
//!          └──────────────┘
//!                 │
//!        ┌────────┴────────┐
//!        ▼                 ▼
//! ┌─────────────┐   ┌──────────────┐
//! │ CacheStore  │   │ DnsProvider  │
//! │  (ids)      │   │ (zone/CRUD)  │
//! └─────────────┘   └──────────────┘
//! ```
//!
//! ## Error Policy
//!
//! Every collaborator returns `Result`. The engine handles each error where it
//! happens: it logs it and carries on as if the value were absent, which in
//! practice ends the run early. Nothing is retried; the next scheduled
//! invocation starts from scratch.

use crate::config::{ManagedDomain, SyncConfig};
use crate::error::Result;
use crate::traits::{
    CacheRecord, CacheStore, DnsProvider, IpSource, RecordKind, RecordPayload, RecordResolver,
};
use std::net::{IpAddr, Ipv6Addr};
use tracing::{debug, error, info, warn};

/// How a single run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No expected address could be determined; nothing to do
    NoAddress,

    /// DNS already answers with the expected address
    InSync { address: Ipv6Addr },

    /// Zone lookup failed or was ambiguous; nothing published
    ZoneNotFound,

    /// No AAAA record existed and one was created
    Created {
        zone_id: String,
        record_id: String,
    },

    /// Record creation failed
    CreateFailed,

    /// The existing AAAA record was updated
    Updated { record_id: String },

    /// Record update failed; the cache was cleared
    UpdateFailed,
}

/// Single-pass reconciliation driver
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Call [`SyncEngine::run_once()`] once per scheduled invocation
/// 3. Drop
///
/// The engine holds no state between runs other than what it writes through
/// the [`CacheStore`].
pub struct SyncEngine {
    /// The hostname being kept in sync
    domain: ManagedDomain,

    /// Cached `domain.fqdn()`
    fqdn: String,

    /// TTL for created and updated records
    ttl: u32,

    /// Expected address source
    ip_source: Box<dyn IpSource>,

    /// Recorded address resolver
    resolver: Box<dyn RecordResolver>,

    /// DNS provider control plane
    provider: Box<dyn DnsProvider>,

    /// Provider id cache
    cache_store: Box<dyn CacheStore>,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// Fails only if `config` does not validate.
    pub fn new(
        config: &SyncConfig,
        ip_source: Box<dyn IpSource>,
        resolver: Box<dyn RecordResolver>,
        provider: Box<dyn DnsProvider>,
        cache_store: Box<dyn CacheStore>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            fqdn: config.domain.fqdn(),
            domain: config.domain.clone(),
            ttl: config.ttl,
            ip_source,
            resolver,
            provider,
            cache_store,
        })
    }

    /// Run one reconciliation pass
    ///
    /// Never fails: every problem is logged and reflected in the outcome.
    pub async fn run_once(&self) -> RunOutcome {
        let Some(expected) = self.expected_address().await else {
            return RunOutcome::NoAddress;
        };

        let recorded = self.recorded_address().await;
        if recorded == Some(IpAddr::V6(expected)) {
            info!("{} already resolves to {}", self.fqdn, expected);
            return RunOutcome::InSync { address: expected };
        }

        info!(
            "{} needs update: {} -> {}",
            self.fqdn,
            recorded.map_or_else(|| "none".to_string(), |ip| ip.to_string()),
            expected
        );

        let (mut zone_id, mut record_id) = self.load_cache().await;

        if zone_id.is_none() || record_id.is_none() {
            zone_id = self.find_zone().await;
            if let Some(ref zone) = zone_id {
                record_id = self.list_records(zone).await;
                if let Some(ref record) = record_id {
                    self.save_cache(Some(zone.clone()), Some(record.clone())).await;
                }
            }
        }

        let Some(zone_id) = zone_id else {
            error!("No usable zone for {}, nothing published", self.fqdn);
            return RunOutcome::ZoneNotFound;
        };

        match record_id {
            None => match self.create_record(&zone_id, expected).await {
                Some(new_record_id) => {
                    self.save_cache(Some(zone_id.clone()), Some(new_record_id.clone()))
                        .await;
                    RunOutcome::Created {
                        zone_id,
                        record_id: new_record_id,
                    }
                }
                None => RunOutcome::CreateFailed,
            },
            Some(record_id) => match self.update_record(&zone_id, &record_id, expected).await {
                Some(_) => RunOutcome::Updated { record_id },
                None => {
                    // The cached id may point at a deleted record; rediscover next run
                    self.clear_cache().await;
                    RunOutcome::UpdateFailed
                }
            },
        }
    }

    /// Current expected address, or `None` (logged) if it cannot be determined
    pub async fn expected_address(&self) -> Option<Ipv6Addr> {
        match self.ip_source.current().await {
            Ok(address) => {
                debug!(
                    "Expected address from {}: {}",
                    self.ip_source.source_name(),
                    address
                );
                Some(address)
            }
            Err(e) => {
                error!(
                    "Failed to determine expected address via {}: {}",
                    self.ip_source.source_name(),
                    e
                );
                None
            }
        }
    }

    /// Currently published address, or `None` (logged) if resolution fails
    pub async fn recorded_address(&self) -> Option<IpAddr> {
        match self.resolver.resolve(&self.fqdn).await {
            Ok(address) => {
                debug!("Recorded address for {}: {}", self.fqdn, address);
                Some(address)
            }
            Err(e) => {
                warn!("Failed to resolve {}: {}", self.fqdn, e);
                None
            }
        }
    }

    /// Look up the zone id for the managed domain's parent zone
    ///
    /// Exactly one zone with that exact name must exist. Zero or several is
    /// logged (with the ambiguous set) and yields `None` so that no zone is
    /// ever mutated by guesswork.
    pub async fn find_zone(&self) -> Option<String> {
        let zones = match self.provider.list_zones(&self.domain.zone).await {
            Ok(zones) => zones,
            Err(e) => {
                error!(
                    "{}: list zones {} failed: {}",
                    self.provider.provider_name(),
                    self.domain.zone,
                    e
                );
                return None;
            }
        };

        let matching: Vec<_> = zones
            .iter()
            .filter(|zone| zone.name.eq_ignore_ascii_case(&self.domain.zone))
            .collect();

        match matching.as_slice() {
            [zone] => {
                debug!("Found zone {} ({})", zone.name, zone.id);
                Some(zone.id.clone())
            }
            [] => {
                error!("List zones {}: 0 matching zones", self.domain.zone);
                None
            }
            many => {
                let ids: Vec<&str> = many.iter().map(|zone| zone.id.as_str()).collect();
                error!(
                    "List zones {}: {} matching zones ({}), refusing to choose",
                    self.domain.zone,
                    many.len(),
                    ids.join(", ")
                );
                None
            }
        }
    }

    /// Find the AAAA record for the managed domain, pruning conflicts
    ///
    /// Walks the listing in provider order: every CNAME is deleted, the first
    /// AAAA is retained and every later AAAA is deleted. Returns the retained
    /// record id, or `None` if there is none or the listing failed.
    pub async fn list_records(&self, zone_id: &str) -> Option<String> {
        let records = match self.provider.list_records(zone_id, &self.fqdn).await {
            Ok(records) => records,
            Err(e) => {
                error!(
                    "{}: list records {} failed: {}",
                    self.provider.provider_name(),
                    self.fqdn,
                    e
                );
                return None;
            }
        };

        let mut retained: Option<String> = None;

        for record in records
            .iter()
            .filter(|record| record.name.eq_ignore_ascii_case(&self.fqdn))
        {
            match record.kind {
                RecordKind::Cname => {
                    warn!(
                        "Deleting CNAME {} -> {} ({}), it conflicts with AAAA",
                        record.name, record.content, record.id
                    );
                    self.delete_record(zone_id, &record.id).await;
                }
                RecordKind::Aaaa if retained.is_some() => {
                    warn!(
                        "Deleting duplicate AAAA {} -> {} ({})",
                        record.name, record.content, record.id
                    );
                    self.delete_record(zone_id, &record.id).await;
                }
                RecordKind::Aaaa => {
                    debug!(
                        "Found AAAA {} -> {} ({})",
                        record.name, record.content, record.id
                    );
                    retained = Some(record.id.clone());
                }
                RecordKind::Other(ref kind) => {
                    debug!("Leaving {} record {} alone", kind, record.id);
                }
            }
        }

        retained
    }

    /// Create the AAAA record; returns the new record id
    pub async fn create_record(&self, zone_id: &str, content: Ipv6Addr) -> Option<String> {
        let payload = RecordPayload::aaaa(&self.fqdn, content, self.ttl);

        match self.provider.create_record(zone_id, &payload).await {
            Ok(record) => {
                info!(
                    "{}: created AAAA {} -> {} ({})",
                    self.provider.provider_name(),
                    self.fqdn,
                    content,
                    record.id
                );
                Some(record.id)
            }
            Err(e) => {
                error!(
                    "{}: create AAAA {} -> {} failed: {}",
                    self.provider.provider_name(),
                    self.fqdn,
                    content,
                    e
                );
                None
            }
        }
    }

    /// Point the existing AAAA record at `content`; returns the record id
    pub async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        content: Ipv6Addr,
    ) -> Option<String> {
        let payload = RecordPayload::aaaa(&self.fqdn, content, self.ttl);

        match self.provider.update_record(zone_id, record_id, &payload).await {
            Ok(record) => {
                info!(
                    "{}: updated AAAA {} -> {} ({})",
                    self.provider.provider_name(),
                    self.fqdn,
                    content,
                    record.id
                );
                Some(record.id)
            }
            Err(e) => {
                error!(
                    "{}: update AAAA {} ({}) -> {} failed: {}",
                    self.provider.provider_name(),
                    self.fqdn,
                    record_id,
                    content,
                    e
                );
                None
            }
        }
    }

    /// Delete a record; returns whether the provider accepted the call
    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> bool {
        match self.provider.delete_record(zone_id, record_id).await {
            Ok(()) => {
                info!(
                    "{}: deleted record {}",
                    self.provider.provider_name(),
                    record_id
                );
                true
            }
            Err(e) => {
                error!(
                    "{}: delete record {} failed: {}",
                    self.provider.provider_name(),
                    record_id,
                    e
                );
                false
            }
        }
    }

    /// Cached `(zone_id, record_id)` for the managed domain
    ///
    /// Anything unreadable, or written for a different domain, reads as
    /// `(None, None)`.
    pub async fn load_cache(&self) -> (Option<String>, Option<String>) {
        match self.cache_store.read().await {
            Ok(Some(record)) => {
                if record.domain != self.fqdn {
                    info!(
                        "Ignoring cache written for {:?}, now managing {}",
                        record.domain, self.fqdn
                    );
                }
                record.ids_for(&self.fqdn)
            }
            Ok(None) => (None, None),
            Err(e) => {
                error!("Failed to load cache: {}", e);
                (None, None)
            }
        }
    }

    /// Persist ids for the managed domain (either may be `None`)
    pub async fn save_cache(&self, zone_id: Option<String>, record_id: Option<String>) {
        let record = CacheRecord::new(self.fqdn.clone(), zone_id, record_id);
        if let Err(e) = self.cache_store.write(&record).await {
            error!("Failed to save cache: {}", e);
        }
    }

    /// Drop both cached ids, keeping the domain
    pub async fn clear_cache(&self) {
        if let Err(e) = self.cache_store.write(&CacheRecord::cleared(&self.fqdn)).await {
            error!("Failed to clear cache: {}", e);
        }
    }
}
