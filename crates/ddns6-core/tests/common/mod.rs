//! Test doubles and common utilities for engine contract tests
//!
//! The mock provider keeps an in-memory zone/record table and counts every
//! call. The provider-backed resolver answers from that same table, so a
//! successful create or update is immediately visible to the next run, as
//! it would be once DNS has propagated.

#![allow(dead_code)]

use ddns6_core::error::{Error, Result};
use ddns6_core::traits::{
    CacheRecord, CacheStore, DnsProvider, DnsRecord, IpSource, RecordKind, RecordPayload,
    RecordResolver, Zone,
};
use ddns6_core::{ManagedDomain, MemoryCacheStore, ProviderConfig, SyncConfig, SyncEngine};
use std::net::{IpAddr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const RECORD: &str = "api";
pub const ZONE: &str = "example.com";
pub const FQDN: &str = "api.example.com";
pub const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";

pub fn addr(s: &str) -> Ipv6Addr {
    s.parse().expect("valid IPv6 literal")
}

/// Minimal valid configuration for the managed domain
pub fn test_config() -> SyncConfig {
    SyncConfig::new(
        ManagedDomain::new(RECORD, ZONE),
        ProviderConfig::new("test-token"),
        "/nonexistent/ddns6.json",
    )
}

/// An IpSource returning a fixed answer
pub struct StaticIpSource {
    address: Option<Ipv6Addr>,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(address: Ipv6Addr) -> Self {
        Self {
            address: Some(address),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that always fails, as on a host without an IPv6 route
    pub fn unavailable() -> Self {
        Self {
            address: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv6Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address
            .ok_or_else(|| Error::address_discovery("Network is unreachable"))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// A resolver returning a fixed answer
pub struct StaticResolver {
    address: Option<IpAddr>,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new(address: Option<IpAddr>) -> Self {
        Self {
            address,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl RecordResolver for StaticResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address
            .ok_or_else(|| Error::not_found(format!("{hostname}: NXDOMAIN")))
    }
}

/// Mutable state behind MockDnsProvider
#[derive(Default)]
pub struct ProviderState {
    pub zones: Vec<Zone>,
    pub records: Vec<DnsRecord>,
    pub fail_list_zones: bool,
    pub fail_create: bool,
    pub fail_update: bool,
    pub fail_delete: bool,
    pub next_id: usize,

    pub list_zones_calls: usize,
    pub list_records_calls: usize,
    pub created: Vec<RecordPayload>,
    pub updated: Vec<(String, RecordPayload)>,
    pub deleted: Vec<String>,
}

impl ProviderState {
    pub fn total_calls(&self) -> usize {
        self.list_zones_calls
            + self.list_records_calls
            + self.created.len()
            + self.updated.len()
            + self.deleted.len()
    }

    pub fn mutating_calls(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

/// A DnsProvider over an in-memory record table that tracks calls
///
/// Failed calls are still counted.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    pub state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider hosting the test zone
    pub fn with_zone() -> Self {
        let provider = Self::new();
        provider.add_zone(ZONE_ID, ZONE);
        provider
    }

    pub fn add_zone(&self, id: &str, name: &str) {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    pub fn add_record(&self, id: &str, kind: &str, name: &str, content: &str) {
        self.state.lock().unwrap().records.push(DnsRecord {
            id: id.to_string(),
            kind: RecordKind::from(kind.to_string()),
            name: name.to_string(),
            content: content.to_string(),
        });
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.state.lock().unwrap().fail_update = fail;
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub fn set_fail_list_zones(&self, fail: bool) {
        self.state.lock().unwrap().fail_list_zones = fail;
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().total_calls()
    }

    pub fn mutating_calls(&self) -> usize {
        self.state.lock().unwrap().mutating_calls()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn created(&self) -> Vec<RecordPayload> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn updated(&self) -> Vec<(String, RecordPayload)> {
        self.state.lock().unwrap().updated.clone()
    }

    pub fn record_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self, zone_name: &str) -> Result<Vec<Zone>> {
        let mut state = self.state.lock().unwrap();
        state.list_zones_calls += 1;
        if state.fail_list_zones {
            return Err(Error::http("connection refused"));
        }
        Ok(state
            .zones
            .iter()
            .filter(|z| z.name == zone_name)
            .cloned()
            .collect())
    }

    async fn list_records(&self, _zone_id: &str, record_name: &str) -> Result<Vec<DnsRecord>> {
        let mut state = self.state.lock().unwrap();
        state.list_records_calls += 1;
        Ok(state
            .records
            .iter()
            .filter(|r| r.name == record_name)
            .cloned()
            .collect())
    }

    async fn create_record(&self, _zone_id: &str, payload: &RecordPayload) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.created.push(payload.clone());
        if state.fail_create {
            return Err(Error::provider("mock", "Record quota exceeded"));
        }

        state.next_id += 1;
        let record = DnsRecord {
            id: format!("created-{}", state.next_id),
            kind: payload.kind.clone(),
            name: payload.name.clone(),
            content: payload.content.clone(),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        _zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord> {
        let mut state = self.state.lock().unwrap();
        state.updated.push((record_id.to_string(), payload.clone()));
        if state.fail_update {
            return Err(Error::provider("mock", "Record does not exist"));
        }

        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::provider("mock", "Record does not exist"))?;
        record.content = payload.content.clone();
        Ok(record.clone())
    }

    async fn delete_record(&self, _zone_id: &str, record_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deleted.push(record_id.to_string());
        if state.fail_delete {
            return Err(Error::provider("mock", "Record is locked"));
        }

        state.records.retain(|r| r.id != record_id);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A resolver answering from MockDnsProvider's record table
pub struct ProviderBackedResolver {
    provider: MockDnsProvider,
}

impl ProviderBackedResolver {
    pub fn new(provider: &MockDnsProvider) -> Self {
        Self {
            provider: provider.clone(),
        }
    }
}

#[async_trait::async_trait]
impl RecordResolver for ProviderBackedResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr> {
        let state = self.provider.state.lock().unwrap();
        let record = state
            .records
            .iter()
            .find(|r| r.name == hostname && r.kind == RecordKind::Aaaa)
            .ok_or_else(|| Error::not_found(format!("{hostname}: NXDOMAIN")))?;
        record
            .content
            .parse()
            .map_err(|_| Error::not_found(format!("{hostname}: bad content")))
    }
}

/// A CacheStore that counts reads and writes
#[derive(Clone, Default)]
pub struct CountingCacheStore {
    inner: MemoryCacheStore,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl CountingCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CacheRecord) -> Self {
        Self {
            inner: MemoryCacheStore::with_record(record),
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<CacheRecord> {
        self.inner.snapshot().await
    }
}

#[async_trait::async_trait]
impl CacheStore for CountingCacheStore {
    async fn read(&self) -> Result<Option<CacheRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read().await
    }

    async fn write(&self, record: &CacheRecord) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(record).await
    }
}

/// Build an engine over the test doubles
pub fn engine(
    ip_source: impl IpSource + 'static,
    resolver: impl RecordResolver + 'static,
    provider: &MockDnsProvider,
    cache: impl CacheStore + 'static,
) -> SyncEngine {
    SyncEngine::new(
        &test_config(),
        Box::new(ip_source),
        Box::new(resolver),
        Box::new(provider.clone()),
        Box::new(cache),
    )
    .expect("engine construction succeeds")
}
