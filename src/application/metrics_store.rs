//! Session-scoped store of computed category metrics.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::metrics::CategoryMetrics;

/// In-memory metrics cache for the dashboard session. Single async writer
/// (the metrics aggregator), read by the presentation layer as cloned
/// snapshots. Invalidated only by explicit user action or session end;
/// never persisted.
#[derive(Default)]
pub struct MetricsStore {
    entries: RwLock<HashMap<String, CategoryMetrics>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, slug: &str) -> Option<CategoryMetrics> {
        self.entries.read().await.get(slug).cloned()
    }

    pub async fn insert(&self, metrics: CategoryMetrics) {
        let mut entries = self.entries.write().await;
        entries.insert(metrics.slug.clone(), metrics);
    }

    pub async fn remove(&self, slug: &str) -> Option<CategoryMetrics> {
        self.entries.write().await.remove(slug)
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        debug!("Cleared {} cached metrics entries", count);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Full snapshot for the presentation layer.
    pub async fn snapshot(&self) -> HashMap<String, CategoryMetrics> {
        self.entries.read().await.clone()
    }

    /// Mean `total_products` over the cached metrics, used for the
    /// app-managed config summary. `None` when the store is empty.
    pub async fn average_products_per_category(&self) -> Option<f64> {
        let entries = self.entries.read().await;
        if entries.is_empty() {
            return None;
        }
        let sum: u64 = entries.values().map(|m| u64::from(m.total_products)).sum();
        Some(sum as f64 / entries.len() as f64)
    }
}
