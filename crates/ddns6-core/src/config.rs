//! Configuration types for ddns6
//!
//! The binary builds a [`SyncConfig`] once at startup and hands it to the
//! engine and the provider. Nothing in it changes for the rest of the process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// TTL applied to every record the engine creates or updates (seconds)
pub const DEFAULT_TTL: u32 = 120;

/// Public IPv6 endpoint the route probe connects toward
///
/// No packet is ever sent to it; only the routing decision matters.
pub const DEFAULT_PROBE_TARGET: &str = "[2400:3200::1]:53";

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Main ddns6 configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// The hostname kept in sync
    pub domain: ManagedDomain,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Path of the provider id cache file
    pub cache_path: PathBuf,

    /// Remote endpoint used by the route probe
    #[serde(default = "default_probe_target")]
    pub probe_target: SocketAddr,

    /// TTL for created and updated records
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl SyncConfig {
    /// Create a configuration with default probe target and TTL
    pub fn new(
        domain: ManagedDomain,
        provider: ProviderConfig,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            domain,
            provider,
            cache_path: cache_path.into(),
            probe_target: default_probe_target(),
            ttl: default_ttl(),
        }
    }

    /// Set the probe target
    pub fn with_probe_target(mut self, probe_target: SocketAddr) -> Self {
        self.probe_target = probe_target;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.domain.validate()?;
        self.provider.validate()?;

        if !self.probe_target.is_ipv6() {
            return Err(crate::Error::config(format!(
                "Probe target must be an IPv6 socket address, got {}",
                self.probe_target
            )));
        }

        // Cloudflare accepts 1 (automatic) or 60..=86400
        if self.ttl != 1 && !(60..=86_400).contains(&self.ttl) {
            return Err(crate::Error::config(format!(
                "TTL must be 1 or between 60 and 86400 seconds, got {}",
                self.ttl
            )));
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Cache path cannot be empty"));
        }

        Ok(())
    }
}

/// The fully-qualified hostname kept in sync: `<record>.<zone>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDomain {
    /// Record label(s) below the zone, e.g. "api"
    pub record: String,
    /// Parent zone name as registered with the provider, e.g. "example.com"
    pub zone: String,
}

impl ManagedDomain {
    /// Create a managed domain from its record label and parent zone
    pub fn new(record: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            zone: zone.into(),
        }
    }

    /// The fully-qualified name, e.g. "api.example.com"
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.record, self.zone)
    }

    /// Validate both parts and the combined name
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.zone)?;
        validate_domain_name(&self.record)?;
        validate_domain_name(&self.fqdn())
    }
}

impl fmt::Display for ManagedDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.record, self.zone)
    }
}

/// Cloudflare provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API token with Zone:Read and DNS:Edit permissions
    pub api_token: String,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl ProviderConfig {
    /// Create a provider configuration against the public Cloudflare API
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: default_api_base(),
        }
    }

    /// Point the provider at a different API base
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.is_empty() {
            return Err(crate::Error::config("Cloudflare API token cannot be empty"));
        }

        if !self.api_base.starts_with("https://") && !self.api_base.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "API base must use HTTP or HTTPS scheme, got {}",
                self.api_base
            )));
        }

        Ok(())
    }
}

// The token must never reach a log line
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Validate that a string is a plausible DNS name (RFC 1035 shape)
///
/// Not exhaustive, but catches empty labels, oversized labels and stray
/// characters before any request is made.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn default_probe_target() -> SocketAddr {
    SocketAddr::from((
        std::net::Ipv6Addr::new(0x2400, 0x3200, 0, 0, 0, 0, 0, 1),
        53,
    ))
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
