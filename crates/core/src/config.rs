//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Base URL used to rewrite scheme+host of every outgoing download URL.
    /// Absent means download URLs are returned as stored.
    #[serde(default)]
    pub update_check_proxy_url: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            update_check_proxy_url: None,
        }
    }
}

/// Release-history backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory store (testing and embedding only; starts empty).
    Memory,
    /// JSON deployments document on the local filesystem, re-read per
    /// request so management-surface mutations show up on the next poll.
    Filesystem {
        /// Path to the deployments document.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/deployments.json"),
        }
    }
}

/// Distributed cache (Redis) endpoint configuration.
///
/// Absent `host` puts the cache manager into a disabled state where every
/// operation is a null/no-op result without error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Cache host; absent disables the distributed cache and metrics store.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// Auth key. When set, connections use TLS with strict CA verification.
    #[serde(default)]
    pub key: Option<String>,
    /// Per-command timeout in milliseconds.
    #[serde(default = "default_redis_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

fn default_redis_port() -> u16 {
    6379
}

fn default_redis_op_timeout_ms() -> u64 {
    5_000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_redis_port(),
            key: None,
            op_timeout_ms: default_redis_op_timeout_ms(),
        }
    }
}

impl RedisConfig {
    /// Whether a distributed cache endpoint is configured.
    pub fn enabled(&self) -> bool {
        self.host.is_some()
    }

    /// Get the per-command timeout as a Duration.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Validate cache configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled() {
            return Ok(());
        }
        if self.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err("redis.host must not be blank when set".to_string());
        }
        if self.port == 0 {
            return Err("redis.port must be non-zero when a host is configured".to_string());
        }
        if self.key.as_deref().is_some_and(|k| k.is_empty()) {
            return Err("redis.key must not be empty when set".to_string());
        }
        if self.op_timeout_ms == 0 {
            return Err("redis.op_timeout_ms must be non-zero".to_string());
        }
        Ok(())
    }
}

/// Cache TTL configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// In-process TTL for cached update-check responses, in milliseconds.
    /// Zero disables the microcache.
    #[serde(default = "default_update_check_mem_ttl_ms")]
    pub update_check_mem_ttl_ms: u64,
    /// In-process TTL for cached diff-package maps, in milliseconds.
    #[serde(default = "default_diff_package_mem_ttl_ms")]
    pub diff_package_mem_ttl_ms: u64,
    /// Distributed-cache TTL for response entries, in seconds; set once on
    /// the first write to a key.
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,
    /// Distributed-cache TTL for diff-map entries, in seconds.
    #[serde(default = "default_diff_map_ttl_secs")]
    pub diff_map_ttl_secs: u64,
}

fn default_update_check_mem_ttl_ms() -> u64 {
    30_000
}

fn default_diff_package_mem_ttl_ms() -> u64 {
    300_000
}

fn default_response_ttl_secs() -> u64 {
    3_600
}

fn default_diff_map_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            update_check_mem_ttl_ms: default_update_check_mem_ttl_ms(),
            diff_package_mem_ttl_ms: default_diff_package_mem_ttl_ms(),
            response_ttl_secs: default_response_ttl_secs(),
            diff_map_ttl_secs: default_diff_map_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Get the update-check microcache TTL as a Duration.
    pub fn update_check_mem_ttl(&self) -> Duration {
        Duration::from_millis(self.update_check_mem_ttl_ms)
    }

    /// Get the diff-map microcache TTL as a Duration.
    pub fn diff_package_mem_ttl(&self) -> Duration {
        Duration::from_millis(self.diff_package_mem_ttl_ms)
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Release-history backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Distributed cache endpoint.
    #[serde(default)]
    pub redis: RedisConfig,
    /// Cache TTLs.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults: memory storage and
    /// the distributed cache disabled.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::Memory,
            redis: RedisConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Apply the platform's historical environment variables on top of the
    /// file/env configuration: `REDIS_HOST`, `REDIS_PORT`, `REDIS_KEY`,
    /// `UPDATE_CHECK_PROXY_URL`, `UPDATECHECK_MEM_TTL_MS`,
    /// `DIFFPACKAGE_MEM_TTL_MS`.
    pub fn apply_platform_env(&mut self) -> Result<(), String> {
        if let Ok(host) = std::env::var("REDIS_HOST") {
            self.redis.host = Some(host);
        }
        if let Ok(port) = std::env::var("REDIS_PORT") {
            self.redis.port = port
                .parse()
                .map_err(|_| format!("REDIS_PORT is not a valid port: {port}"))?;
        }
        if let Ok(key) = std::env::var("REDIS_KEY") {
            self.redis.key = Some(key);
        }
        if let Ok(proxy) = std::env::var("UPDATE_CHECK_PROXY_URL") {
            self.server.update_check_proxy_url = Some(proxy);
        }
        if let Ok(ttl) = std::env::var("UPDATECHECK_MEM_TTL_MS") {
            self.cache.update_check_mem_ttl_ms = ttl
                .parse()
                .map_err(|_| format!("UPDATECHECK_MEM_TTL_MS is not a number: {ttl}"))?;
        }
        if let Ok(ttl) = std::env::var("DIFFPACKAGE_MEM_TTL_MS") {
            self.cache.diff_package_mem_ttl_ms = ttl
                .parse()
                .map_err(|_| format!("DIFFPACKAGE_MEM_TTL_MS is not a number: {ttl}"))?;
        }
        Ok(())
    }

    /// Validate configuration invariants. Returns an error message suitable
    /// for a fatal startup failure.
    pub fn validate(&self) -> Result<(), String> {
        self.redis.validate()
    }
}
