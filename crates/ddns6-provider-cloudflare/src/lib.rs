// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of ddns6's DnsProvider.
//
// ## Behaviour
//
// - One HTTP request per trait call, no retries, no caching
// - Bearer token authentication; the token never appears in logs or Debug
// - 10 second timeout per request, bounding the worst-case run time
// - Every response is parsed as the v4 envelope
//   `{ "result": ..., "errors": [{ "code", "message" }], ... }`;
//   the first error message is logged, and a missing result is an error
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns6_core::config::ProviderConfig;
use ddns6_core::traits::{DnsProvider, DnsRecord, RecordPayload, Zone};
use ddns6_core::{Error, Result};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Provider name used in errors and logs
const PROVIDER_NAME: &str = "cloudflare";

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
    errors: Option<Vec<ApiMessage>>,
}

/// One entry of the envelope's `errors` list
#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: Option<i64>,
    message: Option<String>,
}

/// Cloudflare DNS provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// Fails if the configuration does not validate or the HTTP client
    /// cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .connect_timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token: config.api_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Send one authenticated request and unwrap the response envelope
    ///
    /// # Returns
    ///
    /// - `Ok(T)`: The envelope's `result`
    /// - `Err(Error::Http)`: Transport failure, or a non-JSON error response
    /// - `Err(Error::Json)`: A success response that did not parse
    /// - `Err(Error::Provider)`: The envelope carried no result
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&RecordPayload>,
    ) -> Result<T> {
        let url = format!("{}{}", self.api_base, path);
        let label = request_label(&method, path, query);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }

        match body {
            Some(body) => {
                tracing::info!("{} {}", label, serde_json::to_string(body)?);
                request = request.json(body);
            }
            None => tracing::info!("{}", label),
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} failed: {}", label, e)))?;

        let status = response.status();
        tracing::info!("{}", status);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("{}: failed to read response: {}", label, e)))?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(status_error(status)),
            Err(e) => return Err(e.into()),
        };

        let first_error = envelope
            .errors
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|error| {
                let message = error.message?;
                Some(match error.code {
                    Some(code) => format!("{} (code {})", message, code),
                    None => message,
                })
            });

        if let Some(ref message) = first_error {
            tracing::error!("{}", message);
        }

        envelope.result.ok_or_else(|| {
            Error::provider(
                PROVIDER_NAME,
                first_error.unwrap_or_else(|| format!("{} returned no result ({})", label, status)),
            )
        })
    }
}

/// "GET /zones?name=example.com" style label for logs and errors
fn request_label(method: &Method, path: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return format!("{} {}", method, path);
    }

    let query: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{} {}?{}", method, path, query.join("&"))
}

/// Error for a non-success status whose body was not an API envelope
fn status_error(status: reqwest::StatusCode) -> Error {
    match status.as_u16() {
        401 | 403 => Error::http(format!(
            "Authentication failed: invalid API token or insufficient permissions. Status: {}",
            status
        )),
        429 => Error::http(format!("Rate limit exceeded. Status: {}", status)),
        500..=599 => Error::http(format!("Cloudflare server error (transient): {}", status)),
        _ => Error::http(format!("Unexpected response: {}", status)),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_zones(&self, zone_name: &str) -> Result<Vec<Zone>> {
        self.request(Method::GET, "/zones", &[("name", zone_name)], None)
            .await
    }

    async fn list_records(&self, zone_id: &str, record_name: &str) -> Result<Vec<DnsRecord>> {
        let path = format!("/zones/{}/dns_records", zone_id);
        self.request(Method::GET, &path, &[("name", record_name)], None)
            .await
    }

    async fn create_record(&self, zone_id: &str, payload: &RecordPayload) -> Result<DnsRecord> {
        let path = format!("/zones/{}/dns_records", zone_id);
        self.request(Method::POST, &path, &[], Some(payload)).await
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<DnsRecord> {
        let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);
        self.request(Method::PUT, &path, &[], Some(payload)).await
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);
        // Result is just `{ "id": ... }`
        let _: serde_json::Value = self.request(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        let result = CloudflareProvider::new(&ProviderConfig::new(""));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_provider_name() {
        let provider = CloudflareProvider::new(&ProviderConfig::new("token")).unwrap();
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ProviderConfig::new("token").with_api_base("http://localhost:8080/client/v4/");
        let provider = CloudflareProvider::new(&config).unwrap();
        assert_eq!(provider.api_base, "http://localhost:8080/client/v4");
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = CloudflareProvider::new(&ProviderConfig::new("secret_token_12345")).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareProvider"));
    }

    #[test]
    fn test_request_label() {
        assert_eq!(
            request_label(&Method::GET, "/zones", &[("name", "example.com")]),
            "GET /zones?name=example.com"
        );
        assert_eq!(
            request_label(&Method::DELETE, "/zones/z/dns_records/r", &[]),
            "DELETE /zones/z/dns_records/r"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(reqwest::StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("Authentication failed"));

        let err = status_error(reqwest::StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("transient"));
    }
}
