//! Service traits at the domain boundary.
//!
//! The aggregators depend on [`CatalogGateway`] rather than a concrete HTTP
//! client, so tests drive them through a scripted in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::Category;

/// Outcome of a category-products fetch.
///
/// The gateway never surfaces errors as `Err` here: failures come back as a
/// structured record carrying an HTTP-status-like code, and both variants
/// are cacheable (a cached failure stays a failure until re-probed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CategoryProductsResponse {
    Success(Value),
    Failure { status_code: u16, error: String },
}

impl CategoryProductsResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Read access to the storefront catalog API.
///
/// Failure contract: nothing here returns `Err` or panics. The tree fetch
/// fails soft to an empty list ("unknown", not "no categories"), the
/// products fetch returns a structured failure, the detail fetch returns
/// `None`.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Fetch the full category tree from the storefront page data.
    async fn fetch_category_tree(&self) -> Vec<Category>;

    /// Fetch the product listing for one category slug. `bypass_cache`
    /// appends a cache-busting query parameter so intermediaries cannot
    /// serve a stale body on a manual retry.
    async fn fetch_category_products(
        &self,
        slug: &str,
        bypass_cache: bool,
    ) -> CategoryProductsResponse;

    /// Fetch one product detail record; `None` on any failure.
    async fn fetch_product_detail(&self, slug: &str) -> Option<Value>;
}
