//! Release fixtures.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

use airlift_core::{DiffBlobInfo, DiffPackageMap, Release};

/// A fully-rolled-out, enabled, non-mandatory release.
#[allow(dead_code)]
pub fn release(label: &str, app_version: &str, package_hash: &str) -> Release {
    Release {
        label: label.to_string(),
        app_version: app_version.to_string(),
        package_hash: package_hash.to_string(),
        blob_url: format!("https://storage.example.com/bundles/{package_hash}.zip"),
        size: 4096,
        is_mandatory: false,
        is_disabled: false,
        description: None,
        rollout: None,
        rollout_hold_duration_minutes: None,
        rollout_ramp_duration_minutes: None,
        rollout_upload_time: None,
        diff_package_map: DiffPackageMap::new(),
    }
}

/// A diff-map entry from `source_hash` with a recognizable URL.
#[allow(dead_code)]
pub fn diff_entry(source_hash: &str, target_hash: &str) -> (String, DiffBlobInfo) {
    (
        source_hash.to_string(),
        DiffBlobInfo {
            size: 128,
            url: format!("https://storage.example.com/diffs/{source_hash}-{target_hash}.zip"),
        },
    )
}
