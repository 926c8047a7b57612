//! Storefront gateway - the concrete [`CatalogGateway`] over the proxy API
//!
//! Failure policy: every error is converted at this boundary. The tree
//! fetch fails soft to an empty list, the products fetch returns a
//! structured failure with an HTTP-status-like code, the detail fetch
//! returns `None`. Nothing downstream sees an `Err` or a panic.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::category::{verify_unique_slugs, Category};
use crate::domain::services::{CatalogGateway, CategoryProductsResponse};
use crate::infrastructure::http_client::{FetchError, HttpClient};
use crate::infrastructure::storefront::StorefrontEndpoints;

/// Typed failure for a single gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream returned HTTP {status} for {url}")]
    Http { status: u16, url: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("transport failure for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("undecodable response body from {url}")]
    Decode { url: String },
    #[error("request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// HTTP-status-like code used in failure records: status passthrough,
    /// 408 for timeouts, 503 for transport errors, 502 for undecodable
    /// bodies, 499 (client closed request) for cancellation.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            Self::Timeout { .. } => 408,
            Self::Transport { .. } => 503,
            Self::Decode { .. } => 502,
            Self::Cancelled => 499,
        }
    }

    fn from_fetch(error: FetchError, url: &str) -> Self {
        match error {
            FetchError::Cancelled => Self::Cancelled,
            FetchError::Transport(source) => {
                if source.is_timeout() {
                    Self::Timeout { url: url.to_string() }
                } else if source.is_decode() {
                    Self::Decode { url: url.to_string() }
                } else {
                    Self::Transport {
                        url: url.to_string(),
                        message: source.to_string(),
                    }
                }
            }
        }
    }
}

/// Gateway over the same-origin storefront proxy.
pub struct StorefrontGateway {
    http: HttpClient,
    endpoints: StorefrontEndpoints,
}

impl StorefrontGateway {
    pub fn new(http: HttpClient, endpoints: StorefrontEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn endpoints(&self) -> &StorefrontEndpoints {
        &self.endpoints
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Fetch and normalize one product detail for dashboard display.
    /// `None` on fetch failure, same contract as the raw detail fetch.
    pub async fn fetch_product_view(
        &self,
        slug: &str,
    ) -> Option<crate::domain::product::ProductView> {
        let detail = self.fetch_product_detail(slug).await?;
        Some(crate::infrastructure::extraction::build_product_view(slug, &detail))
    }

    async fn get_json(&self, url: &str, no_store: bool) -> Result<Value, GatewayError> {
        let (status, body) = self
            .http
            .get_json(url, no_store)
            .await
            .map_err(|e| GatewayError::from_fetch(e, url))?;
        if !(200..300).contains(&status) {
            return Err(GatewayError::Http {
                status,
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl CatalogGateway for StorefrontGateway {
    async fn fetch_category_tree(&self) -> Vec<Category> {
        let url = self.endpoints.category_tree_url();
        let body = match self.get_json(url.as_str(), false).await {
            Ok(body) => body,
            Err(error) => {
                warn!("Category tree fetch failed ({}): {}", error.status_code(), error);
                return Vec::new();
            }
        };

        // The tree sits under pageProps in the page-data document; some
        // proxy configurations unwrap it to the top level.
        let categories_value = body
            .get("pageProps")
            .and_then(|props| props.get("categories"))
            .or_else(|| body.get("categories"))
            .cloned();

        let Some(categories_value) = categories_value else {
            warn!("Category tree response has no 'categories' field");
            return Vec::new();
        };

        match serde_json::from_value::<Vec<Category>>(categories_value) {
            Ok(tree) => {
                info!("Loaded category tree with {} root node(s)", tree.len());
                verify_unique_slugs(&tree);
                tree
            }
            Err(error) => {
                warn!("Category tree did not deserialize: {}", error);
                Vec::new()
            }
        }
    }

    async fn fetch_category_products(
        &self,
        slug: &str,
        bypass_cache: bool,
    ) -> CategoryProductsResponse {
        let url = self.endpoints.category_products_url(slug, bypass_cache);
        match self.get_json(url.as_str(), true).await {
            Ok(body) => {
                debug!(
                    "Products response for '{}': {}",
                    slug,
                    summarize_shape(&body)
                );
                CategoryProductsResponse::Success(body)
            }
            Err(error) => {
                warn!("Products fetch failed for '{}': {}", slug, error);
                CategoryProductsResponse::Failure {
                    status_code: error.status_code(),
                    error: error.to_string(),
                }
            }
        }
    }

    async fn fetch_product_detail(&self, slug: &str) -> Option<Value> {
        let url = self.endpoints.product_detail_url(slug);
        match self.get_json(url.as_str(), false).await {
            Ok(body) => {
                debug!("Detail response for '{}': {}", slug, summarize_shape(&body));
                Some(body)
            }
            Err(error) => {
                warn!("Detail fetch failed for '{}': {}", slug, error);
                None
            }
        }
    }
}

/// One-line shape summary for logs, so response bodies never land in the
/// log file verbatim.
fn summarize_shape(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) => {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            format!("object{{{}}}", keys.join(", "))
        }
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_failure_taxonomy() {
        let url = "http://proxy.local/api/products".to_string();
        assert_eq!(GatewayError::Http { status: 404, url: url.clone() }.status_code(), 404);
        assert_eq!(GatewayError::Timeout { url: url.clone() }.status_code(), 408);
        assert_eq!(
            GatewayError::Transport { url: url.clone(), message: "refused".into() }.status_code(),
            503
        );
        assert_eq!(GatewayError::Decode { url }.status_code(), 502);
        assert_eq!(GatewayError::Cancelled.status_code(), 499);
    }

    #[test]
    fn shape_summary_never_echoes_body_values() {
        let body = serde_json::json!({"products": [1, 2], "meta": {"secret": "x"}});
        let summary = summarize_shape(&body);
        assert_eq!(summary, "object{meta, products}");
        assert!(!summary.contains("secret"));
    }
}
