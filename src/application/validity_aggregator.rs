//! Category validity aggregator
//!
//! Probes a list of category slugs strictly sequentially (a deliberate
//! throttle against the upstream API), memoizes raw responses in an
//! injectable [`ValidityCache`], and publishes the running tally after
//! every single slug so observers see monotonic progress.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::events::ProbeEventEmitter;
use crate::domain::events::{ProbeEvent, ProbeProgress};
use crate::domain::services::{CatalogGateway, CategoryProductsResponse};
use crate::domain::validity::{classify_response, ProbeTally, ValidityRecord, ValidityStatus};
use crate::infrastructure::config::PacingConfig;

/// Memo of raw category-products responses keyed by slug.
///
/// Explicitly owned and injected rather than module-level state, with a
/// documented lifecycle: `get`, `insert`, `clear`. Failures are cached too;
/// a failed probe stays failed until an explicit retry bypasses the cache.
#[derive(Default)]
pub struct ValidityCache {
    entries: RwLock<HashMap<String, CategoryProductsResponse>>,
}

impl ValidityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, slug: &str) -> Option<CategoryProductsResponse> {
        self.entries.read().await.get(slug).cloned()
    }

    pub async fn insert(&self, slug: String, response: CategoryProductsResponse) {
        self.entries.write().await.insert(slug, response);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        debug!("Cleared {} cached probe responses", count);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[derive(Default)]
struct ProbeState {
    records: HashMap<String, ValidityRecord>,
    tally: ProbeTally,
}

/// Sequential probe loop over category slugs.
pub struct ValidityAggregator {
    gateway: Arc<dyn CatalogGateway>,
    cache: Arc<ValidityCache>,
    emitter: ProbeEventEmitter,
    pacing: PacingConfig,
    state: RwLock<ProbeState>,
}

impl ValidityAggregator {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        cache: Arc<ValidityCache>,
        emitter: ProbeEventEmitter,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            gateway,
            cache,
            emitter,
            pacing,
            state: RwLock::new(ProbeState::default()),
        }
    }

    pub fn cache(&self) -> &ValidityCache {
        &self.cache
    }

    pub fn emitter(&self) -> &ProbeEventEmitter {
        &self.emitter
    }

    /// Probe every slug in order, publishing the tally after each one.
    ///
    /// Cache hits are served without a network call. Cancellation between
    /// items stops the loop and returns the partial tally; it is not an
    /// error. Nothing in here throws past the aggregator boundary.
    pub async fn probe_categories(
        &self,
        slugs: &[String],
        cancellation: Option<&CancellationToken>,
    ) -> ProbeTally {
        let session_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let total = slugs.len() as u32;

        {
            let mut state = self.state.write().await;
            state.tally = ProbeTally::new(total);
        }

        info!("🔍 Probing {} categories (session {})", total, session_id);
        self.emitter
            .emit_probe(ProbeEvent::Started {
                session_id: session_id.clone(),
                total,
            })
            .await;

        let mut cancelled = false;
        for (index, slug) in slugs.iter().enumerate() {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                warn!("🛑 Probe cancelled after {} of {} slugs", index, total);
                cancelled = true;
                break;
            }

            let (record, from_cache) = self.probe_slug(slug, false).await;

            let tally = {
                let mut state = self.state.write().await;
                state.tally.record(record.status);
                state.records.insert(slug.clone(), record.clone());
                state.tally
            };

            self.emitter.emit_probe(ProbeEvent::Record(record)).await;
            self.emitter
                .emit_probe(ProbeEvent::Progress(ProbeProgress::from_tally(tally, slug)))
                .await;

            // Pacing applies to real upstream traffic only; cache hits are
            // free. The last slug needs no trailing delay.
            if !from_cache && index + 1 < slugs.len() {
                tokio::time::sleep(self.pacing.inter_request_delay()).await;
            }
        }

        let tally = self.tally().await;
        info!(
            "Probe finished: {} valid, {} invalid, {} of {} processed",
            tally.valid, tally.invalid, tally.processed, tally.total
        );
        self.emitter
            .emit_probe(ProbeEvent::Completed {
                session_id,
                tally,
                cancelled,
                duration_ms: started.elapsed().as_millis() as u64,
            })
            .await;

        tally
    }

    /// Re-probe exactly one slug, bypassing the cache with a cache-busting
    /// query parameter.
    ///
    /// The tallies are recomputed from the full record map afterwards, not
    /// incrementally, since a retry can flip a slug's status.
    pub async fn probe_one(&self, slug: &str) -> ValidityRecord {
        info!("🔄 Re-probing '{}' (cache bypassed)", slug);
        let (record, _) = self.probe_slug(slug, true).await;

        let tally = {
            let mut state = self.state.write().await;
            state.records.insert(slug.to_string(), record.clone());

            let mut tally = ProbeTally::new(state.records.len() as u32);
            for existing in state.records.values() {
                tally.record(existing.status);
            }
            state.tally = tally;
            tally
        };

        self.emitter.emit_probe(ProbeEvent::Record(record.clone())).await;
        self.emitter
            .emit_probe(ProbeEvent::Progress(ProbeProgress::from_tally(tally, slug)))
            .await;

        record
    }

    /// Empty the cache and zero all tallies and records.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        let mut state = self.state.write().await;
        state.records.clear();
        state.tally = ProbeTally::default();
        info!("Probe cache and stats cleared");
    }

    /// Zero tallies and records without touching the cache, so subsequent
    /// probes of the same slugs are served from cache.
    pub async fn reset_stats(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.tally = ProbeTally::default();
        info!("Probe stats reset (cache kept)");
    }

    /// Current tally snapshot.
    pub async fn tally(&self) -> ProbeTally {
        self.state.read().await.tally
    }

    /// Snapshot of the per-slug record map.
    pub async fn records(&self) -> HashMap<String, ValidityRecord> {
        self.state.read().await.records.clone()
    }

    /// Fetch (or reuse) the raw response for one slug and classify it.
    /// Returns the record and whether the response came from the cache.
    async fn probe_slug(&self, slug: &str, bypass_cache: bool) -> (ValidityRecord, bool) {
        let (response, from_cache) = if bypass_cache {
            let response = self.gateway.fetch_category_products(slug, true).await;
            self.cache.insert(slug.to_string(), response.clone()).await;
            (response, false)
        } else if let Some(cached) = self.cache.get(slug).await {
            debug!("Cache hit for '{}'", slug);
            (cached, true)
        } else {
            let response = self.gateway.fetch_category_products(slug, false).await;
            self.cache.insert(slug.to_string(), response.clone()).await;
            (response, false)
        };

        let record = match &response {
            CategoryProductsResponse::Success(raw) => match classify_response(raw) {
                ValidityStatus::Ok => ValidityRecord::ok(slug),
                ValidityStatus::Ko => {
                    ValidityRecord::ko(slug, "response carries no products")
                }
            },
            CategoryProductsResponse::Failure { status_code, error } => {
                ValidityRecord::ko(slug, format!("[{status_code}] {error}"))
            }
        };

        (record, from_cache)
    }
}
