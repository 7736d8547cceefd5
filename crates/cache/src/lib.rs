//! Tiered caching and the metrics pipeline for the Airlift acquisition
//! service.
//!
//! Three layers, all optional to the correctness of a request:
//! - [`Microcache`]: a short-TTL in-process map smoothing burst traffic
//! - the distributed response/diff-map cache (ops namespace) on
//!   [`RedisManager`]
//! - [`MetricsStore`]: atomic, batched per-release counters (metrics
//!   namespace)
//!
//! Cache errors never fail a request: reads degrade to misses, writes are
//! logged and swallowed.

pub mod error;
pub mod manager;
pub mod metrics;
pub mod microcache;
pub mod response;

pub use error::{CacheError, CacheResult};
pub use manager::RedisManager;
pub use metrics::MetricsStore;
pub use microcache::Microcache;
