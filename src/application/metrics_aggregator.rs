//! Category metrics aggregator
//!
//! For one slug: fetch the product listing, sample a bounded number of
//! detail records sequentially, and derive pricing/stock summaries plus the
//! simulated structure breakdown. An empty listing yields `None` ("no
//! data"), never a zero-valued metrics object. Batch runs process one slug
//! at a time with a configurable inter-slug delay.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::events::ProbeEventEmitter;
use crate::application::metrics_store::MetricsStore;
use crate::domain::events::MetricsEvent;
use crate::domain::metrics::{
    simulated_structure_distribution, structure_percentages, CategoryMetrics, PricingSummary,
    StockSummary,
};
use crate::domain::services::{CatalogGateway, CategoryProductsResponse};
use crate::infrastructure::config::PacingConfig;
use crate::infrastructure::extraction::{derive_detail_slug, extract_in_stock, extract_price, extract_product_list};

/// Sequential metrics computation over category slugs.
pub struct MetricsAggregator {
    gateway: Arc<dyn CatalogGateway>,
    store: Arc<MetricsStore>,
    emitter: ProbeEventEmitter,
    pacing: PacingConfig,
    /// How many products from the front of the listing get a detail fetch.
    sample_limit: usize,
}

impl MetricsAggregator {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        store: Arc<MetricsStore>,
        emitter: ProbeEventEmitter,
        pacing: PacingConfig,
        sample_limit: usize,
    ) -> Self {
        Self {
            gateway,
            store,
            emitter,
            pacing,
            sample_limit: sample_limit.max(1),
        }
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    /// Compute metrics for one slug. `None` means "no data" (empty or
    /// unfetchable listing), which callers must keep distinct from a
    /// zero-valued metrics object. Successful results are cached in the
    /// session store.
    pub async fn compute_metrics(&self, slug: &str) -> Option<CategoryMetrics> {
        self.emitter
            .emit_metrics(MetricsEvent::Started { slug: slug.to_string() })
            .await;

        let listing = match self.gateway.fetch_category_products(slug, false).await {
            CategoryProductsResponse::Success(raw) => raw,
            CategoryProductsResponse::Failure { status_code, error } => {
                warn!("No metrics for '{}': fetch failed [{}] {}", slug, status_code, error);
                self.emitter
                    .emit_metrics(MetricsEvent::NoData {
                        slug: slug.to_string(),
                        reason: format!("[{status_code}] {error}"),
                    })
                    .await;
                return None;
            }
        };

        let products = extract_product_list(&listing);
        if products.is_empty() {
            debug!("No metrics for '{}': empty product list", slug);
            self.emitter
                .emit_metrics(MetricsEvent::NoData {
                    slug: slug.to_string(),
                    reason: "empty product list".to_string(),
                })
                .await;
            return None;
        }

        let total_products = products.len() as u32;

        // Bounded sample from the front of the listing, details fetched
        // strictly sequentially.
        let mut prices = Vec::new();
        let mut sampled_details: u32 = 0;
        let mut in_stock_sampled: u32 = 0;

        let sample: Vec<String> = products
            .iter()
            .take(self.sample_limit)
            .filter_map(derive_detail_slug)
            .collect();

        for (index, detail_slug) in sample.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing.inter_request_delay()).await;
            }
            let Some(detail) = self.gateway.fetch_product_detail(detail_slug).await else {
                debug!("Detail fetch failed for '{}', skipping sample", detail_slug);
                continue;
            };
            sampled_details += 1;
            if let Some(price) = extract_price(&detail) {
                prices.push(price);
            }
            if extract_in_stock(&detail) == Some(true) {
                in_stock_sampled += 1;
            }
        }

        let pricing = PricingSummary::from_samples(&prices)
            .unwrap_or_else(|| PricingSummary::simulated_for(slug));
        let stock = StockSummary::from_samples(in_stock_sampled, sampled_details, total_products)
            .unwrap_or_else(|| StockSummary::simulated_for(slug, total_products));

        // No structural signal exists upstream; the breakdown is always
        // simulated and flagged as such.
        let structure_distribution = simulated_structure_distribution(slug, total_products);
        let structure_percentage = structure_percentages(&structure_distribution, total_products);

        let metrics = CategoryMetrics {
            slug: slug.to_string(),
            total_products,
            pricing,
            stock,
            structure_distribution,
            structure_percentage,
            structure_simulated: true,
            computed_at: Utc::now(),
        };

        info!(
            "📊 Metrics for '{}': {} products, {} sampled, pricing {}",
            slug,
            total_products,
            sampled_details,
            if metrics.pricing.simulated { "simulated" } else { "real" }
        );

        self.store.insert(metrics.clone()).await;
        self.emitter
            .emit_metrics(MetricsEvent::Computed {
                slug: slug.to_string(),
                metrics: metrics.clone(),
            })
            .await;

        Some(metrics)
    }

    /// Compute metrics for many slugs, one at a time (batch size fixed at
    /// 1, a deliberate serialization against upstream rate limits), with the
    /// configured inter-slug delay. Individual "no data" outcomes are
    /// logged and skipped; they never fail the batch.
    pub async fn compute_multiple_metrics(
        &self,
        slugs: &[String],
        cancellation: Option<&CancellationToken>,
    ) -> HashMap<String, CategoryMetrics> {
        let mut results = HashMap::new();
        let mut skipped: u32 = 0;

        for (index, slug) in slugs.iter().enumerate() {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                warn!("🛑 Metrics batch cancelled after {} of {} slugs", index, slugs.len());
                break;
            }
            if index > 0 {
                tokio::time::sleep(self.pacing.inter_batch_delay()).await;
            }

            match self.compute_metrics(slug).await {
                Some(metrics) => {
                    results.insert(slug.clone(), metrics);
                }
                None => {
                    skipped += 1;
                }
            }
        }

        info!(
            "Metrics batch finished: {} computed, {} skipped",
            results.len(),
            skipped
        );
        self.emitter
            .emit_metrics(MetricsEvent::BatchCompleted {
                computed: results.len() as u32,
                skipped,
            })
            .await;

        results
    }
}
