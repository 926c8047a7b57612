//! Scripted in-memory gateway shared by the aggregator integration tests.

// Each test binary compiles this module separately and uses a different
// subset of it.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use catalog_pulse::domain::{CatalogGateway, Category, CategoryProductsResponse};

/// Gateway whose responses are scripted per slug, with call counters so
/// tests can assert how many network round-trips a scenario really issued.
#[derive(Default)]
pub struct ScriptedGateway {
    products: Mutex<HashMap<String, CategoryProductsResponse>>,
    details: Mutex<HashMap<String, Option<Value>>>,
    product_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_products(self, slug: &str, response: CategoryProductsResponse) -> Self {
        self.products
            .lock()
            .unwrap()
            .insert(slug.to_string(), response);
        self
    }

    pub fn script_detail(self, slug: &str, detail: Option<Value>) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(slug.to_string(), detail);
        self
    }

    /// Overwrite a products script mid-test (e.g. a category that recovers
    /// before a retry).
    pub fn rescript_products(&self, slug: &str, response: CategoryProductsResponse) {
        self.products
            .lock()
            .unwrap()
            .insert(slug.to_string(), response);
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogGateway for ScriptedGateway {
    async fn fetch_category_tree(&self) -> Vec<Category> {
        Vec::new()
    }

    async fn fetch_category_products(
        &self,
        slug: &str,
        _bypass_cache: bool,
    ) -> CategoryProductsResponse {
        self.product_calls.fetch_add(1, Ordering::SeqCst);
        self.products
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .unwrap_or(CategoryProductsResponse::Failure {
                status_code: 404,
                error: format!("no script for category '{slug}'"),
            })
    }

    async fn fetch_product_detail(&self, slug: &str) -> Option<Value> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .flatten()
    }
}
