//! Filesystem-backed release-history store.
//!
//! Reads a JSON deployments document of the form:
//!
//! ```json
//! {
//!   "deployments": {
//!     "<deploymentKey>": {
//!       "name": "Production",
//!       "packages": [ { "label": "v1", "appVersion": "1.0.0", ... } ]
//!     }
//!   }
//! }
//! ```
//!
//! The document is re-read on every lookup so that management-surface
//! mutations are reflected on the next poll without coordination.

use crate::error::{StorageError, StorageResult};
use crate::traits::PackageStore;
use airlift_core::Release;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct DeploymentsDocument {
    deployments: HashMap<String, DeploymentRecord>,
}

#[derive(Debug, Deserialize)]
struct DeploymentRecord {
    #[serde(default)]
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(default)]
    packages: Vec<Release>,
}

/// Release-history store backed by a JSON document on disk.
pub struct FilesystemBackend {
    path: PathBuf,
}

impl FilesystemBackend {
    /// Create a backend reading from `path`. The document must exist and
    /// parse; this is verified eagerly so misconfiguration fails at startup.
    pub async fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let backend = Self {
            path: path.as_ref().to_path_buf(),
        };
        backend.load().await?;
        Ok(backend)
    }

    async fn load(&self) -> StorageResult<DeploymentsDocument> {
        let raw = tokio::fs::read(&self.path).await?;
        serde_json::from_slice(&raw).map_err(|e| {
            StorageError::Malformed(format!("{}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl PackageStore for FilesystemBackend {
    async fn get_package_history(&self, deployment_key: &str) -> StorageResult<Vec<Release>> {
        let document = self.load().await?;
        document
            .deployments
            .get(deployment_key)
            .map(|record| record.packages.clone())
            .ok_or_else(|| StorageError::NotFound(format!("deployment key: {deployment_key}")))
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.load().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "deployments": {
            "DK_PROD": {
                "name": "Production",
                "packages": [
                    {
                        "label": "v1",
                        "appVersion": "1.0.0",
                        "packageHash": "H1",
                        "blobUrl": "https://blobs.example.com/H1",
                        "size": 42,
                        "isMandatory": true
                    }
                ]
            },
            "DK_EMPTY": { "name": "Staging" }
        }
    }"#;

    async fn write_document(content: &str) -> (tempfile::TempDir, FilesystemBackend) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        tokio::fs::write(&path, content).await.unwrap();
        let backend = FilesystemBackend::new(&path).await.unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn parses_deployments_document() {
        let (_dir, backend) = write_document(DOCUMENT).await;

        let history = backend.get_package_history("DK_PROD").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].label, "v1");
        assert_eq!(history[0].package_hash, "H1");
        assert!(history[0].is_mandatory);

        assert!(backend.get_package_history("DK_EMPTY").await.unwrap().is_empty());
        assert!(matches!(
            backend.get_package_history("DK_MISSING").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn mutations_are_visible_on_next_read() {
        let (dir, backend) = write_document(DOCUMENT).await;

        let updated = DOCUMENT.replace("\"isMandatory\": true", "\"isMandatory\": false");
        tokio::fs::write(dir.path().join("deployments.json"), updated)
            .await
            .unwrap();

        let history = backend.get_package_history("DK_PROD").await.unwrap();
        assert!(!history[0].is_mandatory);
    }

    #[tokio::test]
    async fn missing_document_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FilesystemBackend::new(dir.path().join("nope.json")).await.is_err());
    }

    #[tokio::test]
    async fn malformed_document_fails_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        tokio::fs::write(&path, "{\"deployments\":{}}").await.unwrap();
        let backend = FilesystemBackend::new(&path).await.unwrap();

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(matches!(
            backend.health_check().await,
            Err(StorageError::Malformed(_))
        ));
    }
}
