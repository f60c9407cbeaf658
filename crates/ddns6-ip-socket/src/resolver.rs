//! System resolver for the recorded address

use async_trait::async_trait;
use ddns6_core::traits::RecordResolver;
use ddns6_core::{Error, Result};
use std::net::IpAddr;

/// Resolves the managed hostname through the operating system's resolver
///
/// Goes through `getaddrinfo`, so `/etc/hosts`, nsswitch and any local
/// caching resolver apply, exactly as for other programs on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create a system resolver
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordResolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr> {
        // Port is irrelevant; only the address is consulted
        let addresses: Vec<IpAddr> = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| Error::not_found(format!("Failed to resolve {}: {}", hostname, e)))?
            .map(|socket| socket.ip())
            .collect();

        preferred_address(&addresses)
            .ok_or_else(|| Error::not_found(format!("{} resolved to no addresses", hostname)))
    }
}

/// First IPv6 answer, since that is what an AAAA record produces; otherwise
/// the first answer of any family
fn preferred_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .find(|ip| ip.is_ipv6())
        .or_else(|| addresses.first())
        .copied()
}
