//! Error types for ddns6
//!
//! Every externally-facing operation (socket probe, DNS resolution, HTTP call,
//! JSON parse, cache file I/O) returns this error. The engine never propagates
//! it past a run: it logs the error where it happens and treats the result as
//! absent.

use thiserror::Error;

/// Result type alias for ddns6 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ddns6
#[derive(Error, Debug)]
pub enum Error {
    /// Expected-address discovery failed (no IPv6 route, bad probe target)
    #[error("Address discovery error: {0}")]
    AddressDiscovery(String),

    /// Socket-level errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// HTTP transport errors (connect, timeout, unexpected status)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by the provider API in its response envelope
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Cache file errors
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A lookup produced no answer
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create an address discovery error
    pub fn address_discovery(msg: impl Into<String>) -> Self {
        Self::AddressDiscovery(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-reported error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a filesystem error
    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::Filesystem(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
