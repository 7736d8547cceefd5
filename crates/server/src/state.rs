//! Application state shared across handlers.

use crate::proxy::DownloadProxy;
use airlift_cache::{MetricsStore, Microcache, RedisManager};
use airlift_core::config::AppConfig;
use airlift_core::{CacheableResponse, DiffPackageMap};
use airlift_storage::PackageStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Release-history backend.
    pub storage: Arc<dyn PackageStore>,
    /// Distributed response/diff-map cache.
    pub redis: RedisManager,
    /// Per-release counter store.
    pub metrics: MetricsStore,
    /// In-process cache of update-check responses.
    pub response_microcache: Arc<Microcache<CacheableResponse>>,
    /// In-process cache of diff-package maps.
    pub diff_microcache: Arc<Microcache<DiffPackageMap>>,
    /// Download-URL rewriter, when a proxy base URL is configured.
    pub proxy: Option<Arc<DownloadProxy>>,
}

impl AppState {
    /// Create a new application state. A malformed proxy base URL disables
    /// rewriting; every affected download URL would fall back to the
    /// original anyway.
    pub fn new(config: AppConfig, storage: Arc<dyn PackageStore>, redis: RedisManager) -> Self {
        let proxy = config
            .server
            .update_check_proxy_url
            .as_deref()
            .and_then(|base| match DownloadProxy::new(base) {
                Ok(proxy) => Some(Arc::new(proxy)),
                Err(e) => {
                    tracing::error!(base, error = %e, "invalid update-check proxy URL, rewriting disabled");
                    None
                }
            });

        let response_microcache = Arc::new(Microcache::new(config.cache.update_check_mem_ttl()));
        let diff_microcache = Arc::new(Microcache::new(config.cache.diff_package_mem_ttl()));
        let metrics = MetricsStore::new(redis.clone());

        Self {
            config: Arc::new(config),
            storage,
            redis,
            metrics,
            response_microcache,
            diff_microcache,
            proxy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlift_storage::MemoryStore;

    fn build_state(mut config: AppConfig, proxy: Option<&str>) -> AppState {
        config.server.update_check_proxy_url = proxy.map(str::to_string);
        AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            RedisManager::disabled(),
        )
    }

    #[test]
    fn valid_proxy_url_enables_rewriting() {
        let state = build_state(AppConfig::for_testing(), Some("https://cdn.example.org"));
        assert!(state.proxy.is_some());
    }

    #[test]
    fn invalid_proxy_url_disables_rewriting() {
        let state = build_state(AppConfig::for_testing(), Some("not a url"));
        assert!(state.proxy.is_none());
    }

    #[test]
    fn microcache_ttls_come_from_config() {
        let mut config = AppConfig::for_testing();
        config.cache.update_check_mem_ttl_ms = 0;
        let state = build_state(config, None);

        // TTL 0 disables the response microcache.
        state.response_microcache.set(
            "k".to_string(),
            CacheableResponse {
                status_code: 200,
                body: airlift_core::CacheableBody { releases: vec![] },
            },
        );
        assert!(state.response_microcache.get("k").is_none());
    }
}
