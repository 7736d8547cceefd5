//! Release records, acquisition requests, and update descriptors.
//!
//! Wire names follow the platform's stored document format (camelCase), which
//! is also the format persisted verbatim in the distributed response cache.

use crate::rollout::RolloutRamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Location and size of a binary-diff archive between two package hashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBlobInfo {
    /// Byte size of the diff archive.
    pub size: u64,
    /// Download URL of the diff archive.
    pub url: String,
}

/// Mapping from a *source* package hash to the diff archive that upgrades it
/// to the release carrying the map.
pub type DiffPackageMap = HashMap<String, DiffBlobInfo>;

/// One versioned bundle published to a deployment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Server-assigned monotonically increasing identifier, unique within a
    /// deployment (e.g. `v17`).
    pub label: String,
    /// Semver range (or exact version) naming the binary versions this bundle
    /// is compatible with.
    pub app_version: String,
    /// Content hash of the full bundle archive; primary content identity.
    pub package_hash: String,
    /// URL from which the full bundle can be downloaded.
    pub blob_url: String,
    /// Byte size of the full bundle.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub is_disabled: bool,
    /// Optional free text shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rollout percentage in `[0, 100]`; absent or 100 means fully rolled out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout_hold_duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout_ramp_duration_minutes: Option<i64>,
    /// Upload timestamp in epoch milliseconds; anchors the time-based ramp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout_upload_time: Option<i64>,
    /// Source package hash -> diff archive reaching this release.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub diff_package_map: DiffPackageMap,
}

impl Release {
    /// Rollout-ramp parameters of this release.
    pub fn rollout_ramp(&self) -> RolloutRamp {
        RolloutRamp {
            rollout: self.rollout,
            hold_duration_minutes: self.rollout_hold_duration_minutes,
            ramp_duration_minutes: self.rollout_ramp_duration_minutes,
            upload_time: self.rollout_upload_time,
        }
    }
}

/// The pre-selection response body stored verbatim in the distributed cache:
/// the release list for one deployment, pre-filtered to entries whose
/// `app_version` range could match some request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheableBody {
    pub releases: Vec<Release>,
}

/// A cacheable response: HTTP status plus the filtered release list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheableResponse {
    pub status_code: u16,
    pub body: CacheableBody,
}

/// Parsed, validated fields of one update-check request, as consumed by the
/// selection engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcquisitionRequest {
    pub deployment_key: String,
    /// The version string exactly as the client sent it.
    pub raw_app_version: String,
    /// The canonical three-segment form used for range satisfaction.
    pub normalized_app_version: String,
    pub client_unique_id: Option<String>,
    pub package_hash: Option<String>,
    pub label: Option<String>,
    /// Companion clients take any update regardless of binary compatibility.
    pub is_companion: bool,
    /// Beta clients bypass rollout gating.
    pub beta: bool,
}

impl AcquisitionRequest {
    /// The version echoed back in responses: raw if present, else normalized.
    pub fn response_app_version(&self) -> &str {
        if self.raw_app_version.is_empty() {
            &self.normalized_app_version
        } else {
            &self.raw_app_version
        }
    }
}

/// The update descriptor returned to clients. Serializes with snake_case keys
/// (the new API shape); the legacy camelCase shape is produced at the HTTP
/// layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub is_available: bool,
    pub is_mandatory: bool,
    pub app_version: String,
    pub target_binary_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_size: Option<u64>,
    pub update_app_version: bool,
}

/// Status reported by clients against a release label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    DeploymentSucceeded,
    DeploymentFailed,
    Downloaded,
}

impl DeploymentStatus {
    /// Counter-field suffix for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeploymentSucceeded => "DeploymentSucceeded",
            Self::DeploymentFailed => "DeploymentFailed",
            Self::Downloaded => "Downloaded",
        }
    }
}

impl FromStr for DeploymentStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "DeploymentSucceeded" => Ok(Self::DeploymentSucceeded),
            "DeploymentFailed" => Ok(Self::DeploymentFailed),
            "Downloaded" => Ok(Self::Downloaded),
            other => Err(crate::Error::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_json_uses_camel_case() {
        let release = Release {
            label: "v3".to_string(),
            app_version: "1.2.3".to_string(),
            package_hash: "hash3".to_string(),
            blob_url: "https://blobs.example.com/3".to_string(),
            size: 1024,
            is_mandatory: true,
            is_disabled: false,
            description: None,
            rollout: Some(25.0),
            rollout_hold_duration_minutes: None,
            rollout_ramp_duration_minutes: None,
            rollout_upload_time: None,
            diff_package_map: HashMap::new(),
        };

        let json = serde_json::to_value(&release).unwrap();
        assert_eq!(json["appVersion"], "1.2.3");
        assert_eq!(json["packageHash"], "hash3");
        assert_eq!(json["isMandatory"], true);
        assert_eq!(json["rollout"], 25.0);
        // Empty diff maps and absent options are omitted entirely.
        assert!(json.get("diffPackageMap").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn release_roundtrips_through_cacheable_response() {
        let release = Release {
            label: "v1".to_string(),
            app_version: "1.0.0".to_string(),
            package_hash: "h1".to_string(),
            blob_url: "https://blobs.example.com/1".to_string(),
            size: 10,
            is_mandatory: false,
            is_disabled: false,
            description: Some("first".to_string()),
            rollout: None,
            rollout_hold_duration_minutes: None,
            rollout_ramp_duration_minutes: None,
            rollout_upload_time: None,
            diff_package_map: HashMap::from([(
                "h0".to_string(),
                DiffBlobInfo {
                    size: 3,
                    url: "https://blobs.example.com/diff/h0-h1".to_string(),
                },
            )]),
        };
        let cacheable = CacheableResponse {
            status_code: 200,
            body: CacheableBody {
                releases: vec![release],
            },
        };

        let json = serde_json::to_string(&cacheable).unwrap();
        let back: CacheableResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cacheable);
    }

    #[test]
    fn deployment_status_parses_exact_names_only() {
        assert_eq!(
            "DeploymentSucceeded".parse::<DeploymentStatus>().unwrap(),
            DeploymentStatus::DeploymentSucceeded
        );
        assert!("deploymentsucceeded".parse::<DeploymentStatus>().is_err());
        assert!("Installed".parse::<DeploymentStatus>().is_err());
    }

    #[test]
    fn update_info_omits_absent_fields() {
        let info = UpdateInfo {
            is_available: false,
            app_version: "1.0.0".to_string(),
            target_binary_range: "1.0.0".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("package_hash").is_none());
        assert!(json.get("download_url").is_none());
        assert_eq!(json["update_app_version"], false);
    }
}
