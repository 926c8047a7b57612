//! HTTP client for catalog probing with rate limiting and cancellation
//!
//! All storefront traffic funnels through this wrapper so the request rate
//! against the upstream proxy is bounded in one place (a governor token
//! bucket) instead of by ad-hoc sleeps scattered through the aggregators.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, CACHE_CONTROL, USER_AGENT},
    Client, Response,
};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// HTTP client configuration for catalog probing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("catalog-pulse/", env!("CARGO_PKG_VERSION")).to_string(),
            // Product endpoints are slow behind the proxy; match the
            // dashboard's 15 s budget.
            timeout_seconds: 15,
            max_requests_per_second: 4,
            follow_redirects: true,
        }
    }
}

/// Failure surfaced by a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Rate-limited HTTP client shared by every gateway call.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
    cancellation: CancellationToken,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// Token callers clone to cancel every in-flight and future request on
    /// this client.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Fetch a URL after waiting on the rate limiter. Probe requests set
    /// `no_store` so intermediaries do not serve stale listings.
    pub async fn get(&self, url: &str, no_store: bool) -> Result<Response, FetchError> {
        if self.cancellation.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {}
            _ = self.cancellation.cancelled() => {
                warn!("🛑 Request cancelled while rate-limited: {}", url);
                return Err(FetchError::Cancelled);
            }
        }

        debug!("Fetching URL: {} (no_store: {})", url, no_store);

        let mut request = self.client.get(url);
        if no_store {
            request = request.header(CACHE_CONTROL, "no-cache, no-store");
        }

        let response = tokio::select! {
            result = request.send() => result?,
            _ = self.cancellation.cancelled() => {
                warn!("🛑 HTTP request cancelled for URL: {}", url);
                return Err(FetchError::Cancelled);
            }
        };

        debug!("Fetched: {} ({})", url, response.status());
        Ok(response)
    }

    /// Fetch a URL and decode the body as JSON. Status is not checked here;
    /// the gateway maps non-success statuses itself.
    pub async fn get_json(&self, url: &str, no_store: bool) -> Result<(u16, Value), FetchError> {
        let response = self.get(url, no_store).await?;
        let status = response.status().as_u16();
        let body = tokio::select! {
            result = response.json::<Value>() => result?,
            _ = self.cancellation.cancelled() => {
                warn!("🛑 Response reading cancelled for URL: {}", url);
                return Err(FetchError::Cancelled);
            }
        };
        Ok((status, body))
    }

    /// Get the configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        let config = HttpClientConfig::default();
        let client = HttpClient::new(config);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_second: 0,
            ..Default::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[tokio::test]
    async fn test_cancelled_client_refuses_requests() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        client.cancellation_token().cancel();

        let result = client.get("http://localhost:1/never", false).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
