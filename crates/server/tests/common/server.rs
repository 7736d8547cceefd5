//! Server test utilities.

use airlift_cache::RedisManager;
use airlift_core::config::AppConfig;
use airlift_server::{AppState, create_router};
use airlift_storage::MemoryStore;
use std::sync::Arc;

/// A test server wrapper with all dependencies: memory-backed release
/// history and the distributed cache disabled.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with default test configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::for_testing())
    }

    /// Create a test server with a custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            config,
            store.clone() as Arc<dyn airlift_storage::PackageStore>,
            RedisManager::disabled(),
        );
        let router = create_router(state.clone());
        Self {
            router,
            state,
            store,
        }
    }

    /// The memory-backed release store, for seeding histories.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}
