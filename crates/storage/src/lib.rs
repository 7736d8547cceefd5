//! Release-history backends for the Airlift acquisition service.
//!
//! The acquisition path treats the release store as a read-only collaborator:
//! it fetches the package history for a deployment key and reflects whatever
//! the management surface last wrote.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use backends::memory::MemoryStore;
pub use error::{StorageError, StorageResult};
pub use traits::PackageStore;

use airlift_core::config::StorageConfig;
use std::sync::Arc;

/// Create a release-history store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn PackageStore>> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(MemoryStore::new()) as Arc<dyn PackageStore>),
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend) as Arc<dyn PackageStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_config_memory() {
        let store = from_config(&StorageConfig::Memory).await.unwrap();
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn from_config_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        tokio::fs::write(&path, "{\"deployments\":{}}").await.unwrap();

        let store = from_config(&StorageConfig::Filesystem { path }).await.unwrap();
        store.health_check().await.unwrap();
    }
}
