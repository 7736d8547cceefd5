//! HTTP acquisition surface for the Airlift OTA update platform.
//!
//! This crate provides the mobile-client-facing plane:
//! - Update checks over a tiered cache (microcache, distributed, storage)
//! - Install/download status reports with fire-and-forget counter updates
//! - Dual legacy/new wire shapes for queries, bodies, and responses
//! - Health and Prometheus endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod proxy;
pub mod routes;
pub mod state;
pub mod wire;

pub use error::ApiError;
pub use proxy::DownloadProxy;
pub use routes::create_router;
pub use state::AppState;
