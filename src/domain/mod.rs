//! Domain module - catalog entities, derived aggregates, and service seams
//!
//! Everything here is either a pure function over externally-supplied data
//! (category trees, raw responses) or a type shared with the dashboard
//! frontend via ts-rs.

pub mod category;
pub mod events;
pub mod metrics;
pub mod product;
pub mod services;
pub mod validity;

// Re-export commonly used items
pub use category::{extract_leaf_slugs, resolve_path, verify_unique_slugs, Category};
pub use events::{EngineEvent, MetricsEvent, ProbeEvent, ProbeProgress};
pub use metrics::{CategoryMetrics, PricingSummary, StockSummary, StructureKind};
pub use product::ProductView;
pub use services::{CatalogGateway, CategoryProductsResponse};
pub use validity::{ProbeTally, ValidityRecord, ValidityStatus};
