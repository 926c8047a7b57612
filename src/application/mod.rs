//! Application module - aggregation use cases, session state, and event
//! emission wired between the domain seams and the infrastructure.

pub mod events;
pub mod metrics_aggregator;
pub mod metrics_store;
pub mod validity_aggregator;

pub use events::ProbeEventEmitter;
pub use metrics_aggregator::MetricsAggregator;
pub use metrics_store::MetricsStore;
pub use validity_aggregator::{ValidityAggregator, ValidityCache};
