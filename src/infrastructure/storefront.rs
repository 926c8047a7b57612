//! Storefront endpoint constants and URL builders.
//!
//! All catalog traffic goes through a same-origin proxy in front of the
//! retailer's API; the paths here are the proxy-side routes. Slugs are
//! percent-encoded by the `url` crate's query serializer, never by hand.

use anyhow::{Context, Result};
use chrono::Utc;
use url::Url;

/// Default endpoint configuration.
pub mod defaults {
    /// Same-origin proxy base in front of the retailer API.
    pub const PROXY_BASE_URL: &str = "http://localhost:3000/api/proxy/";

    /// Path to the storefront page-data document carrying the category tree.
    pub const CATEGORY_TREE_PATH: &str = "page-data/catalog.json";

    /// Path to the category product listing (expects `?category=<slug>`).
    pub const CATEGORY_PRODUCTS_PATH: &str = "products";

    /// Path prefix for per-product detail records.
    pub const PRODUCT_DETAIL_PATH: &str = "products";

    /// Query parameter used to bust intermediary caches on manual retries.
    pub const CACHE_BUST_PARAM: &str = "_";
}

/// Resolved storefront endpoints for one proxy base URL.
#[derive(Debug, Clone)]
pub struct StorefrontEndpoints {
    base: Url,
}

impl StorefrontEndpoints {
    /// Parse and normalize the proxy base URL. A missing trailing slash
    /// would make `Url::join` drop the last path segment, so it is added
    /// here.
    pub fn new(base_url: &str) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized)
            .with_context(|| format!("Invalid proxy base URL: {base_url}"))?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of the page-data document carrying the category tree.
    pub fn category_tree_url(&self) -> Url {
        self.base
            .join(defaults::CATEGORY_TREE_PATH)
            .unwrap_or_else(|_| self.base.clone())
    }

    /// Product listing URL for one category slug, optionally with a
    /// timestamp cache-buster appended.
    pub fn category_products_url(&self, slug: &str, bypass_cache: bool) -> Url {
        let mut url = self
            .base
            .join(defaults::CATEGORY_PRODUCTS_PATH)
            .unwrap_or_else(|_| self.base.clone());
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("category", slug);
            if bypass_cache {
                query.append_pair(
                    defaults::CACHE_BUST_PARAM,
                    &Utc::now().timestamp_millis().to_string(),
                );
            }
        }
        url
    }

    /// Detail record URL for one product slug, trailing slash included
    /// (the upstream redirects without it).
    pub fn product_detail_url(&self, slug: &str) -> Url {
        self.base
            .join(&format!("{}/{}/", defaults::PRODUCT_DETAIL_PATH, slug))
            .unwrap_or_else(|_| self.base.clone())
    }
}

impl Default for StorefrontEndpoints {
    fn default() -> Self {
        // The default base is a compile-time constant and always parses.
        Self::new(defaults::PROXY_BASE_URL).expect("default proxy base URL must parse")
    }
}
