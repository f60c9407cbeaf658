//! Core traits for ddns6
//!
//! - [`IpSource`]: Discover the host's expected IPv6 address
//! - [`RecordResolver`]: Resolve the currently published address
//! - [`DnsProvider`]: Provider control-plane calls
//! - [`CacheStore`]: Persistence for cached provider ids

pub mod cache_store;
pub mod dns_provider;
pub mod ip_source;

pub use cache_store::{CacheRecord, CacheStore};
pub use dns_provider::{DnsProvider, DnsRecord, RecordKind, RecordPayload, Zone};
pub use ip_source::{IpSource, RecordResolver};
