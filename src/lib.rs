//! catalog-pulse - catalog analytics engine for the storefront dashboard
//!
//! The data backbone behind the dashboard's analytics views: category tree
//! traversal, a rate-limited gateway over the storefront proxy, a validity
//! aggregator that probes category slugs with an injectable response cache,
//! and a metrics aggregator that derives per-category pricing, stock, and
//! (simulated) structure summaries.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the engine surface the dashboard backend wires up
pub use application::{
    MetricsAggregator, MetricsStore, ProbeEventEmitter, ValidityAggregator, ValidityCache,
};
pub use domain::{
    extract_leaf_slugs, resolve_path, CatalogGateway, Category, CategoryMetrics,
    CategoryProductsResponse, EngineEvent, ProbeTally, ProductView, ValidityRecord, ValidityStatus,
};
pub use infrastructure::{
    AppConfig, ConfigManager, EngineConfig, HttpClient, HttpClientConfig, StorefrontEndpoints,
    StorefrontGateway,
};
