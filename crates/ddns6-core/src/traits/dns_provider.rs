// # DNS Provider Trait
//
// Defines the raw control-plane operations the engine needs from a DNS
// provider: zone lookup, record listing and AAAA record CRUD.
//
// ## Implementations
//
// - Cloudflare: `ddns6-provider-cloudflare` crate
//
// ## Division of Labour
//
// Providers perform exactly one API call per method and report failures as
// errors. Deciding what to create, update or delete, and what to do when a
// call fails, belongs to `SyncEngine`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;

/// A provider zone (registered domain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider zone id
    pub id: String,
    /// Zone name, e.g. "example.com"
    pub name: String,
}

/// DNS record type as far as the engine cares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordKind {
    /// IPv6 address record
    Aaaa,
    /// Alias record; cannot coexist with AAAA for the same name
    Cname,
    /// Anything else (TXT, MX, ...), left untouched
    Other(String),
}

impl From<String> for RecordKind {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "AAAA" => RecordKind::Aaaa,
            "CNAME" => RecordKind::Cname,
            _ => RecordKind::Other(value),
        }
    }
}

impl From<RecordKind> for String {
    fn from(kind: RecordKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Aaaa => f.write_str("AAAA"),
            RecordKind::Cname => f.write_str("CNAME"),
            RecordKind::Other(other) => f.write_str(other),
        }
    }
}

/// A DNS record as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record id
    pub id: String,
    /// Record type
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (address, alias target, ...)
    #[serde(default)]
    pub content: String,
}

/// Body of a create or update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    /// Record type
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Fully-qualified record name
    pub name: String,
    /// Record content
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Whether the provider should proxy traffic for this name
    pub proxied: bool,
}

impl RecordPayload {
    /// An unproxied AAAA record pointing `name` at `address`
    pub fn aaaa(name: impl Into<String>, address: Ipv6Addr, ttl: u32) -> Self {
        Self {
            kind: RecordKind::Aaaa,
            name: name.into(),
            content: address.to_string(),
            ttl,
            proxied: false,
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine only ever calls them
/// sequentially from one task.
///
/// # No Retries
///
/// A failed call returns an error. The engine logs it, ends the run, and the
/// next scheduled invocation starts over.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List zones whose name matches `zone_name`
    ///
    /// The provider may return more than one zone or zones with other names;
    /// the engine filters and insists on exactly one exact match.
    async fn list_zones(&self, zone_name: &str) -> Result<Vec<Zone>, crate::Error>;

    /// List all records named `record_name` in `zone_id`, in provider order
    async fn list_records(
        &self,
        zone_id: &str,
        record_name: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record and return it as stored by the provider
    async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, crate::Error>;

    /// Overwrite an existing record and return it as stored by the provider
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord, crate::Error>;

    /// Delete a record
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
