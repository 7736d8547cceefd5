//! Core domain types and shared logic for the Airlift acquisition service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Releases, package histories, and cacheable response bodies
//! - Update-check requests and update descriptors
//! - App-version normalization and semver range applicability
//! - Rollout cohort selection and time-ramped rollout percentages
//! - The newest-first update-selection engine
//! - Canonical cache-key construction

pub mod cache_key;
pub mod config;
pub mod error;
pub mod release;
pub mod rollout;
pub mod selection;
pub mod version;

pub use cache_key::{CACHE_SCHEMA_VERSION, acquisition_cache_key};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use release::{
    AcquisitionRequest, CacheableBody, CacheableResponse, DeploymentStatus, DiffBlobInfo,
    DiffPackageMap, Release, UpdateInfo,
};
pub use rollout::{RolloutRamp, effective_rollout, hash_identifier, is_selected_for_rollout};
pub use selection::{Selection, finalize, is_satisfiable_range, select_update};
pub use version::normalize_app_version;

/// Prefix under which response-cache keys are namespaced in the distributed cache.
pub const DEPLOYMENT_KEY_PREFIX: &str = "deploymentKey:";

/// Oldest SDK version that reports metrics in the batched (aggregated) format.
pub const METRICS_BREAKING_VERSION: &str = "1.5.2-beta";
