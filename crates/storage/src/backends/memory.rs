//! In-memory release-history store.

use crate::error::{StorageError, StorageResult};
use crate::traits::PackageStore;
use airlift_core::Release;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for tests and embedding. Deployments must be registered
/// before they resolve; unknown keys return `NotFound` like the real backend.
#[derive(Default)]
pub struct MemoryStore {
    deployments: RwLock<HashMap<String, Vec<Release>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployment with the given history (oldest release first),
    /// replacing any existing history for the key.
    pub fn set_history(&self, deployment_key: impl Into<String>, releases: Vec<Release>) {
        self.deployments
            .write()
            .expect("deployments lock poisoned")
            .insert(deployment_key.into(), releases);
    }

    /// Append a release to a deployment's history, creating the deployment
    /// if needed.
    pub fn push_release(&self, deployment_key: &str, release: Release) {
        self.deployments
            .write()
            .expect("deployments lock poisoned")
            .entry(deployment_key.to_string())
            .or_default()
            .push(release);
    }
}

#[async_trait]
impl PackageStore for MemoryStore {
    async fn get_package_history(&self, deployment_key: &str) -> StorageResult<Vec<Release>> {
        self.deployments
            .read()
            .expect("deployments lock poisoned")
            .get(deployment_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("deployment key: {deployment_key}")))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
