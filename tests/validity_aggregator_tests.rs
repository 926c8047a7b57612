//! Integration tests for the validity aggregator: cache behavior,
//! idempotence, retries, and the progress event stream.

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use catalog_pulse::application::{ProbeEventEmitter, ValidityAggregator, ValidityCache};
use catalog_pulse::domain::{CategoryProductsResponse, EngineEvent, ProbeEvent, ValidityStatus};
use catalog_pulse::infrastructure::PacingConfig;

use common::ScriptedGateway;

fn ok_listing() -> CategoryProductsResponse {
    CategoryProductsResponse::Success(json!({"products": [{"slug": "p1"}]}))
}

fn empty_listing() -> CategoryProductsResponse {
    CategoryProductsResponse::Success(json!({"products": []}))
}

fn aggregator_over(gateway: Arc<ScriptedGateway>) -> ValidityAggregator {
    ValidityAggregator::new(
        gateway,
        Arc::new(ValidityCache::new()),
        ProbeEventEmitter::new(256),
        PacingConfig::immediate(),
    )
}

#[tokio::test]
async fn probing_twice_issues_one_network_call_per_slug() {
    let gateway = Arc::new(ScriptedGateway::new().script_products("mugs", ok_listing()));
    let aggregator = aggregator_over(Arc::clone(&gateway));
    let slugs = vec!["mugs".to_string()];

    aggregator.probe_categories(&slugs, None).await;
    aggregator.probe_categories(&slugs, None).await;
    assert_eq!(gateway.product_calls(), 1);

    // After a cache clear the next probe hits the network again.
    aggregator.clear_cache().await;
    aggregator.probe_categories(&slugs, None).await;
    assert_eq!(gateway.product_calls(), 2);
}

#[tokio::test]
async fn identical_responses_yield_identical_tallies_across_runs() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script_products("mugs", ok_listing())
            .script_products("pens", empty_listing())
            .script_products(
                "desks",
                CategoryProductsResponse::Failure {
                    status_code: 503,
                    error: "unavailable".to_string(),
                },
            ),
    );
    let aggregator = aggregator_over(gateway);
    let slugs: Vec<String> = ["mugs", "pens", "desks"].iter().map(|s| s.to_string()).collect();

    let first = aggregator.probe_categories(&slugs, None).await;
    aggregator.clear_cache().await;
    let second = aggregator.probe_categories(&slugs, None).await;

    assert_eq!(first, second);
    assert_eq!(first.valid, 1);
    assert_eq!(first.invalid, 2);
    assert_eq!(first.processed, 3);
}

#[tokio::test]
async fn retry_bypasses_cache_and_flips_status() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script_products("mugs", empty_listing())
            .script_products("pens", ok_listing()),
    );
    let aggregator = aggregator_over(Arc::clone(&gateway));
    let slugs: Vec<String> = ["mugs", "pens"].iter().map(|s| s.to_string()).collect();

    let tally = aggregator.probe_categories(&slugs, None).await;
    assert_eq!(tally.valid, 1);
    assert_eq!(tally.invalid, 1);

    // The category recovers upstream; a plain re-probe would still see the
    // cached KO, but the retry bypasses the cache.
    gateway.rescript_products("mugs", ok_listing());
    let record = aggregator.probe_one("mugs").await;
    assert_eq!(record.status, ValidityStatus::Ok);

    // Tallies were recomputed from the full record map, not patched.
    let tally = aggregator.tally().await;
    assert_eq!(tally.valid, 2);
    assert_eq!(tally.invalid, 0);
    assert_eq!(tally.total, 2);
}

#[tokio::test]
async fn progress_events_are_monotonic_and_published_per_slug() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .script_products("a", ok_listing())
            .script_products("b", empty_listing())
            .script_products("c", ok_listing()),
    );
    let emitter = ProbeEventEmitter::new(256);
    let mut events = emitter.subscribe();
    let aggregator = ValidityAggregator::new(
        gateway,
        Arc::new(ValidityCache::new()),
        emitter,
        PacingConfig::immediate(),
    );

    let slugs: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    aggregator.probe_categories(&slugs, None).await;

    let mut progress_points = Vec::new();
    let mut saw_completed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::Probe(ProbeEvent::Progress(progress)) => {
                progress_points.push(progress.tally.processed);
            }
            EngineEvent::Probe(ProbeEvent::Completed { tally, cancelled, .. }) => {
                assert!(!cancelled);
                assert_eq!(tally.processed, 3);
                saw_completed = true;
            }
            _ => {}
        }
    }

    // One progress point per slug, strictly increasing.
    assert_eq!(progress_points, vec![1, 2, 3]);
    assert!(saw_completed);
}

#[tokio::test]
async fn cancellation_mid_run_returns_partial_tally() {
    let gateway = Arc::new(ScriptedGateway::new().script_products("a", ok_listing()));
    let emitter = ProbeEventEmitter::new(256);
    let mut events = emitter.subscribe();
    let aggregator = ValidityAggregator::new(
        Arc::<ScriptedGateway>::clone(&gateway),
        Arc::new(ValidityCache::new()),
        emitter,
        PacingConfig::immediate(),
    );

    // Probe "a" once, then cancel before the remaining slugs run.
    let token = CancellationToken::new();
    aggregator.probe_categories(&["a".to_string()], Some(&token)).await;

    token.cancel();
    let slugs: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let tally = aggregator.probe_categories(&slugs, Some(&token)).await;
    assert_eq!(tally.processed, 0);
    assert_eq!(tally.total, 3);

    let mut saw_cancelled_completion = false;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::Probe(ProbeEvent::Completed { cancelled: true, .. }) = event {
            saw_cancelled_completion = true;
        }
    }
    assert!(saw_cancelled_completion);
}

#[tokio::test]
async fn unscripted_slug_becomes_ko_with_status_code() {
    let gateway = Arc::new(ScriptedGateway::new());
    let aggregator = aggregator_over(gateway);

    let tally = aggregator
        .probe_categories(&["ghost-category".to_string()], None)
        .await;
    assert_eq!(tally.invalid, 1);

    let records = aggregator.records().await;
    let error = records["ghost-category"].error.as_deref().unwrap();
    assert!(error.contains("404"));
}
