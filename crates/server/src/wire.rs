//! Wire formats of the acquisition surface.
//!
//! Two families of field names exist for both query strings and JSON bodies:
//! camelCase on the legacy routes and snake_case on the `/v0.1` routes. A
//! single canonical parser accepts either; responses are rendered in the
//! shape matching the route.

use airlift_core::UpdateInfo;
use serde::{Deserialize, Serialize};

/// Which response shape the route speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    /// camelCase keys under `"updateInfo"`.
    Legacy,
    /// snake_case keys under `"update_info"`.
    Snake,
}

/// Update-check query fields, accepting both naming families.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdateCheckQuery {
    #[serde(default, rename = "deploymentKey", alias = "deployment_key")]
    pub deployment_key: Option<String>,
    #[serde(default, rename = "appVersion", alias = "app_version")]
    pub app_version: Option<String>,
    #[serde(default, rename = "packageHash", alias = "package_hash")]
    pub package_hash: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "clientUniqueId", alias = "client_unique_id")]
    pub client_unique_id: Option<String>,
    #[serde(default, rename = "isCompanion", alias = "is_companion")]
    pub is_companion: Option<String>,
    #[serde(default)]
    pub beta: Option<String>,
}

/// Report-deploy body, accepting both naming families.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReportDeployBody {
    #[serde(default, rename = "deploymentKey", alias = "deployment_key")]
    pub deployment_key: Option<String>,
    #[serde(default, rename = "appVersion", alias = "app_version")]
    pub app_version: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "clientUniqueId", alias = "client_unique_id")]
    pub client_unique_id: Option<String>,
    #[serde(default, rename = "previousDeploymentKey", alias = "previous_deployment_key")]
    pub previous_deployment_key: Option<String>,
    #[serde(
        default,
        rename = "previousLabelOrAppVersion",
        alias = "previous_label_or_app_version"
    )]
    pub previous_label_or_app_version: Option<String>,
}

/// Report-download body, accepting both naming families.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReportDownloadBody {
    #[serde(default, rename = "deploymentKey", alias = "deployment_key")]
    pub deployment_key: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Case-insensitive boolean query/body flag. Anything but `true`/`1` is
/// false, matching the platform's historical parsing.
pub fn parse_bool_flag(value: Option<&str>) -> bool {
    match value {
        Some(v) => v.eq_ignore_ascii_case("true") || v == "1",
        None => false,
    }
}

/// New-shape update-check response: `{"update_info": {...snake_case...}}`.
#[derive(Debug, Serialize)]
pub struct SnakeUpdateCheckBody {
    pub update_info: UpdateInfo,
}

/// Legacy-shape update-check response: `{"updateInfo": {...camelCase...}}`.
#[derive(Debug, Serialize)]
pub struct LegacyUpdateCheckBody {
    #[serde(rename = "updateInfo")]
    pub update_info: LegacyUpdateInfo,
}

/// The update descriptor with legacy camelCase keys; structurally identical
/// to [`UpdateInfo`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUpdateInfo {
    pub is_available: bool,
    pub is_mandatory: bool,
    pub app_version: String,
    pub target_binary_range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "downloadURL", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_size: Option<u64>,
    pub update_app_version: bool,
}

impl From<UpdateInfo> for LegacyUpdateInfo {
    fn from(info: UpdateInfo) -> Self {
        Self {
            is_available: info.is_available,
            is_mandatory: info.is_mandatory,
            app_version: info.app_version,
            target_binary_range: info.target_binary_range,
            package_hash: info.package_hash,
            label: info.label,
            description: info.description,
            download_url: info.download_url,
            package_size: info.package_size,
            update_app_version: info.update_app_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_accepts_both_naming_families() {
        let camel: UpdateCheckQuery = serde_json::from_str(
            r#"{"deploymentKey":"DK","appVersion":"1.0.0","clientUniqueId":"c1"}"#,
        )
        .unwrap();
        assert_eq!(camel.deployment_key.as_deref(), Some("DK"));
        assert_eq!(camel.client_unique_id.as_deref(), Some("c1"));

        let snake: UpdateCheckQuery = serde_json::from_str(
            r#"{"deployment_key":"DK","app_version":"1.0.0","client_unique_id":"c1"}"#,
        )
        .unwrap();
        assert_eq!(snake.deployment_key.as_deref(), Some("DK"));
        assert_eq!(snake.client_unique_id.as_deref(), Some("c1"));
    }

    #[test]
    fn bool_flags_parse_case_insensitively() {
        assert!(parse_bool_flag(Some("true")));
        assert!(parse_bool_flag(Some("TRUE")));
        assert!(parse_bool_flag(Some("True")));
        assert!(parse_bool_flag(Some("1")));
        assert!(!parse_bool_flag(Some("false")));
        assert!(!parse_bool_flag(Some("0")));
        assert!(!parse_bool_flag(Some("yes")));
        assert!(!parse_bool_flag(None));
    }

    #[test]
    fn legacy_shape_uses_camel_case_and_download_url_capitalization() {
        let info = UpdateInfo {
            is_available: true,
            is_mandatory: true,
            app_version: "1.0.0".to_string(),
            target_binary_range: "1.0.0".to_string(),
            package_hash: Some("H2".to_string()),
            label: Some("v2".to_string()),
            description: None,
            download_url: Some("https://blobs.example.com/H2".to_string()),
            package_size: Some(42),
            update_app_version: false,
        };

        let legacy = serde_json::to_value(LegacyUpdateCheckBody {
            update_info: info.clone().into(),
        })
        .unwrap();
        assert_eq!(legacy["updateInfo"]["isAvailable"], true);
        assert_eq!(legacy["updateInfo"]["packageHash"], "H2");
        assert_eq!(
            legacy["updateInfo"]["downloadURL"],
            "https://blobs.example.com/H2"
        );
        assert!(legacy["updateInfo"].get("download_url").is_none());

        let snake = serde_json::to_value(SnakeUpdateCheckBody { update_info: info }).unwrap();
        assert_eq!(snake["update_info"]["is_available"], true);
        assert_eq!(snake["update_info"]["package_size"], 42);
        assert!(snake["update_info"].get("isAvailable").is_none());
    }

    #[test]
    fn report_bodies_accept_both_naming_families() {
        let body: ReportDeployBody = serde_json::from_str(
            r#"{"deployment_key":"DK","app_version":"1.0.0","previous_deployment_key":"OLD",
                "previous_label_or_app_version":"v1","status":"DeploymentSucceeded"}"#,
        )
        .unwrap();
        assert_eq!(body.previous_deployment_key.as_deref(), Some("OLD"));
        assert_eq!(body.status.as_deref(), Some("DeploymentSucceeded"));

        let body: ReportDownloadBody =
            serde_json::from_str(r#"{"deploymentKey":"DK","label":"v2"}"#).unwrap();
        assert_eq!(body.deployment_key.as_deref(), Some("DK"));
        assert_eq!(body.label.as_deref(), Some("v2"));
    }
}
