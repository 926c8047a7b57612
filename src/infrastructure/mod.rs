//! Infrastructure module - HTTP access, response extraction, configuration,
//! and logging behind the domain's service seams.

pub mod config;
pub mod extraction;
pub mod gateway;
pub mod http_client;
pub mod logging;
pub mod storefront;

pub use config::{AppConfig, ConfigManager, EngineConfig, PacingConfig};
pub use gateway::{GatewayError, StorefrontGateway};
pub use http_client::{HttpClient, HttpClientConfig};
pub use storefront::StorefrontEndpoints;
