// # Address Discovery Traits
//
// Two read-only queries feed the engine on every run:
//
// - `IpSource::current()`: the IPv6 address this host would use for outbound
//   traffic right now (the *expected* address)
// - `RecordResolver::resolve()`: what public DNS currently answers for the
//   managed hostname (the *recorded* address)
//
// ## Implementations
//
// - `ddns6-ip-socket` crate: UDP route probe and system resolver
//
// ## Usage
//
// ```rust,ignore
// use ddns6_core::{IpSource, RecordResolver};
//
// let expected = source.current().await?;
// let recorded = resolver.resolve("api.example.com").await?;
// if recorded != std::net::IpAddr::V6(expected) {
//     // publish `expected`
// }
// ```

use async_trait::async_trait;
use std::net::{IpAddr, Ipv6Addr};

/// Source of the host's current (expected) IPv6 address
///
/// Implementations must not cache between calls: the engine asks once per run
/// and the answer has to reflect the routing table at that moment.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Return the address the host would use to reach the public IPv6 internet
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv6Addr)`: The preferred outbound address
    /// - `Err(Error)`: No IPv6 route, or the socket could not be set up
    async fn current(&self) -> Result<Ipv6Addr, crate::Error>;

    /// Short name for log lines
    fn source_name(&self) -> &'static str;
}

/// Resolver for the currently published (recorded) address
#[async_trait]
pub trait RecordResolver: Send + Sync {
    /// Resolve `hostname` and return the address it is published under
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: First IPv6 address in the answer, or the first address
    ///   of any family if the answer holds no IPv6 address
    /// - `Err(Error)`: Resolution failed or produced no addresses (NXDOMAIN included)
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, crate::Error>;
}
