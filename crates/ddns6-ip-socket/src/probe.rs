//! UDP route probe
//!
//! Connecting a datagram socket sends nothing; it only asks the kernel to
//! pick a route and a source address for the destination. Reading the
//! socket's local address afterwards yields the address the host would use
//! for outbound IPv6 traffic, which is the address worth publishing.
//!
//! Requires a default IPv6 route. Without one, `connect` fails with
//! "Network is unreachable" and the run ends.

use async_trait::async_trait;
use ddns6_core::traits::IpSource;
use ddns6_core::{Error, Result};
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Expected-address source based on the connected-UDP-socket trick
#[derive(Debug, Clone)]
pub struct UdpProbeSource {
    /// Remote endpoint used for route selection; never contacted
    target: SocketAddr,
}

impl UdpProbeSource {
    /// Create a probe toward `target`, which must be an IPv6 socket address
    pub fn new(target: SocketAddr) -> Result<Self> {
        if !target.is_ipv6() {
            return Err(Error::config(format!("Probe target must be IPv6, got {}", target)));
        }

        Ok(Self { target })
    }
}

#[async_trait]
impl IpSource for UdpProbeSource {
    async fn current(&self) -> Result<Ipv6Addr> {
        let socket = UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| {
                Error::address_discovery(format!("Failed to bind IPv6 UDP socket: {}", e))
            })?;

        socket.connect(self.target).await.map_err(|e| {
            Error::address_discovery(format!("No route toward {}: {}", self.target, e))
        })?;

        let local = socket.local_addr()?;
        tracing::debug!("Route probe toward {} chose {}", self.target, local);

        match local.ip() {
            IpAddr::V6(address) if !address.is_unspecified() => Ok(address),
            other => Err(Error::address_discovery(format!(
                "Kernel selected unusable source address {}",
                other
            ))),
        }
    }

    fn source_name(&self) -> &'static str {
        "udp-probe"
    }
}
