//! Release-history store trait.

use crate::error::StorageResult;
use airlift_core::Release;
use async_trait::async_trait;

/// Read access to per-deployment release histories.
///
/// The acquisition path only ever reads: publishing, promotion, rollback and
/// disabling happen on the management surface and are reflected here on the
/// next read. Histories are returned oldest first.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Fetch the release history for a deployment key, oldest release first.
    ///
    /// Returns `StorageError::NotFound` for an unknown deployment key and an
    /// empty vector for a deployment with no releases yet.
    async fn get_package_history(&self, deployment_key: &str) -> StorageResult<Vec<Release>>;

    /// Check backend connectivity and health.
    async fn health_check(&self) -> StorageResult<()>;
}
