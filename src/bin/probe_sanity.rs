//! Sanity run of the probing pipeline against a live proxy.
//!
//! Loads the engine configuration, fetches the category tree (falling back
//! to the bundled slug list), probes every leaf slug, and prints the final
//! tally. Ctrl-C cancels the run between slugs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use catalog_pulse::application::{ProbeEventEmitter, ValidityAggregator, ValidityCache};
use catalog_pulse::domain::category::fallback_slug_map;
use catalog_pulse::domain::{extract_leaf_slugs, CatalogGateway, EngineEvent, ProbeEvent};
use catalog_pulse::infrastructure::logging;
use catalog_pulse::infrastructure::{
    ConfigManager, EngineConfig, HttpClient, StorefrontEndpoints, StorefrontGateway,
};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;
    logging::log_system_info();

    let engine_config = EngineConfig::load(None).context("Failed to load engine configuration")?;
    let config_manager = ConfigManager::new()?;
    config_manager.initialize_on_first_run().await?;

    let http = HttpClient::new(engine_config.http_client_config())
        .context("Failed to build HTTP client")?;
    let cancellation = http.cancellation_token();

    let endpoints = StorefrontEndpoints::new(&engine_config.proxy_base_url)?;
    let gateway: Arc<dyn CatalogGateway> = Arc::new(StorefrontGateway::new(http, endpoints));

    // Ctrl-C cancels between slugs; in-flight requests are aborted by the
    // client's own token.
    let signal_token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl-C received, cancelling probe");
            signal_token.cancel();
        }
    });

    let tree = gateway.fetch_category_tree().await;
    let slugs = if tree.is_empty() {
        warn!("Category tree unavailable, probing the bundled slug list");
        fallback_slug_map().keys().cloned().collect()
    } else {
        extract_leaf_slugs(&tree)
    };
    info!("Probing {} leaf categories", slugs.len());

    let emitter = ProbeEventEmitter::default();
    let mut events = emitter.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let EngineEvent::Probe(ProbeEvent::Progress(progress)) = event {
                info!(
                    "  progress: {}/{} ({:.0}%), {} valid / {} invalid",
                    progress.tally.processed,
                    progress.tally.total,
                    progress.percentage,
                    progress.tally.valid,
                    progress.tally.invalid
                );
            }
        }
    });

    let aggregator = ValidityAggregator::new(
        gateway,
        Arc::new(ValidityCache::new()),
        emitter,
        engine_config.pacing(),
    );

    let tally = aggregator
        .probe_categories(&slugs, Some(&cancellation))
        .await;

    println!(
        "Probe tally: {} valid, {} invalid, {} of {} processed",
        tally.valid, tally.invalid, tally.processed, tally.total
    );

    config_manager
        .update_app_managed(|managed| {
            managed.last_probe_completed = Some(chrono::Utc::now().to_rfc3339());
            managed.last_probe_valid = Some(tally.valid);
            managed.last_probe_invalid = Some(tally.invalid);
        })
        .await?;

    Ok(())
}
