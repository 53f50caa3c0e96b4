//! Upstream client for calls from the proxy to the forecasting service

use replenish_common::config::ProxyConfig;
use replenish_common::error::{ReplenishError, Result};
use replenish_common::{SecretString, METRICS};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Secondary credential header sent alongside `Authorization`
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Upstream answer before normalization
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub status_text: String,
    pub body: String,
}

/// Forecasting service client
///
/// Holds the pooled reqwest client and the pre-built credential headers. The
/// client keeps no response cache, and every request asks intermediaries not
/// to store the answer either.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    endpoint: Url,
    headers: HeaderMap,
    credential_len: usize,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build a client for the configured upstream endpoint
    pub fn new(config: &ProxyConfig, credential: &SecretString) -> Result<Self> {
        let endpoint = Url::parse(&config.upstream_url).map_err(|e| {
            ReplenishError::config(format!("Invalid upstream URL {}: {}", config.upstream_url, e))
        })?;

        let timeout = Duration::from_millis(config.upstream_timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("replenish-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReplenishError::config(format!("Failed to build upstream HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            headers: credential_headers(credential, config.send_api_key_header)?,
            credential_len: credential.len(),
            timeout,
        })
    }

    /// Upstream endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST the payload upstream and read the whole body as text
    pub async fn forward(&self, payload: &Value) -> Result<UpstreamReply> {
        info!(
            url = %self.endpoint,
            credential_len = self.credential_len,
            timeout_ms = self.timeout.as_millis() as u64,
            "Sending prediction request upstream"
        );
        debug!(body = %payload, "Upstream request body");

        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let body = response.text().await?;

        let elapsed = started.elapsed();
        METRICS.proxy.upstream_response_time.observe(elapsed.as_secs_f64());
        info!(
            status = status.as_u16(),
            status_text = %status_text,
            body_len = body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Upstream responded"
        );

        Ok(UpstreamReply {
            status,
            status_text,
            body,
        })
    }
}

fn credential_headers(credential: &SecretString, send_api_key_header: bool) -> Result<HeaderMap> {
    let invalid = || ReplenishError::config("Upstream credential contains characters not allowed in HTTP headers");

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.expose_secret()))
        .map_err(|_| invalid())?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    // Compatibility shim until upstream confirms which scheme it reads.
    if send_api_key_header {
        let mut api_key = HeaderValue::from_str(credential.expose_secret()).map_err(|_| invalid())?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_sent_in_both_schemes() {
        let headers = credential_headers(&SecretString::new("k-123"), true).unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer k-123");
        assert_eq!(headers[API_KEY_HEADER], "k-123");
        assert_eq!(headers[CACHE_CONTROL], "no-store");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_api_key_header_can_be_disabled() {
        let headers = credential_headers(&SecretString::new("k-123"), false).unwrap();

        assert!(headers.contains_key(AUTHORIZATION));
        assert!(!headers.contains_key(API_KEY_HEADER));
    }

    #[test]
    fn test_credential_with_newline_is_rejected() {
        let err = credential_headers(&SecretString::new("bad\nkey"), true).unwrap_err();
        assert!(matches!(err, ReplenishError::Config(_)));
    }

    #[test]
    fn test_client_rejects_bad_url() {
        let config = ProxyConfig {
            upstream_url: "::not-a-url".to_string(),
            ..ProxyConfig::default()
        };

        assert!(UpstreamClient::new(&config, &SecretString::new("k")).is_err());
    }
}
