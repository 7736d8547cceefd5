//! Status-report endpoints.
//!
//! Reports answer 200 synchronously and dispatch counter updates afterwards:
//! the metrics store is best-effort and must never add latency to (or fail)
//! a request that has already been validated.

use crate::error::{ApiError, ApiResult};
use crate::metrics::{METRICS_DISPATCH_FAILURES, REPORTS_TOTAL};
use crate::state::AppState;
use crate::wire::{ReportDeployBody, ReportDownloadBody};
use airlift_cache::CacheResult;
use airlift_core::{DeploymentStatus, METRICS_BREAKING_VERSION};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use semver::Version;

/// Header carrying the reporting SDK's version.
pub const SDK_VERSION_HEADER: &str = "x-codepush-sdk-version";

/// POST /reportStatus/deploy (and the /v0.1 twin) - install report.
pub async fn report_deploy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReportDeployBody>,
) -> ApiResult<StatusCode> {
    let deployment_key = require(body.deployment_key.as_deref(), "deployment key")?;
    let app_version = require(body.app_version.as_deref(), "app version")?;

    let status = body
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<DeploymentStatus>().map_err(|_| {
                ApiError::BadRequest(format!("Invalid deployment status: {raw}"))
            })
        })
        .transpose()?;
    if status == Some(DeploymentStatus::Downloaded) {
        return Err(ApiError::BadRequest(
            "Invalid deployment status: Downloaded".to_string(),
        ));
    }

    if sdk_reports_batched_metrics(&headers) {
        dispatch_batched_deploy(&state, &body, deployment_key, app_version, status);
    } else {
        // The legacy per-client path needs the client identity to maintain
        // the active-label mapping.
        let client_unique_id = require(body.client_unique_id.as_deref(), "client unique id")?;
        dispatch_legacy_deploy(
            &state,
            deployment_key,
            app_version,
            body.label.as_deref(),
            status,
            client_unique_id,
        );
    }

    REPORTS_TOTAL.with_label_values(&["deploy"]).inc();
    Ok(StatusCode::OK)
}

/// POST /reportStatus/download (and the /v0.1 twin) - download report.
pub async fn report_download(
    State(state): State<AppState>,
    Json(body): Json<ReportDownloadBody>,
) -> ApiResult<StatusCode> {
    let deployment_key = require(body.deployment_key.as_deref(), "deployment key")?.to_string();
    let label = require(body.label.as_deref(), "label")?.to_string();

    let metrics = state.metrics.clone();
    tokio::spawn(async move {
        log_dispatch(
            metrics
                .increment_label_status_count(&deployment_key, &label, DeploymentStatus::Downloaded)
                .await,
            "download count",
        );
    });

    REPORTS_TOTAL.with_label_values(&["download"]).inc();
    Ok(StatusCode::OK)
}

/// SDK versions at or above the breaking version report aggregated metrics;
/// everything else (including unparseable versions) uses the legacy path.
fn sdk_reports_batched_metrics(headers: &HeaderMap) -> bool {
    let Some(raw) = headers
        .get(SDK_VERSION_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Ok(sdk_version) = Version::parse(raw.trim()) else {
        return false;
    };
    let gate = Version::parse(METRICS_BREAKING_VERSION).expect("gate version is valid semver");
    sdk_version >= gate
}

/// New metrics path: a labeled failure bumps its counter; a successful
/// install (or an unlabeled report, counted against the app version) records
/// the transition in one transaction. Afterwards the client's active-label
/// entry on the previous deployment is cleared.
fn dispatch_batched_deploy(
    state: &AppState,
    body: &ReportDeployBody,
    deployment_key: &str,
    app_version: &str,
    status: Option<DeploymentStatus>,
) {
    let metrics = state.metrics.clone();
    let deployment_key = deployment_key.to_string();
    let app_version = app_version.to_string();
    let label = body.label.clone();
    let client_unique_id = body.client_unique_id.clone();
    let previous_deployment_key = body.previous_deployment_key.clone();
    let previous_label = body.previous_label_or_app_version.clone();

    tokio::spawn(async move {
        let result: CacheResult<()> = async {
            match (&label, status) {
                (Some(label), Some(DeploymentStatus::DeploymentFailed)) => {
                    metrics
                        .increment_label_status_count(
                            &deployment_key,
                            label,
                            DeploymentStatus::DeploymentFailed,
                        )
                        .await?;
                }
                (label, _) => {
                    let current_label = label.as_deref().unwrap_or(&app_version);
                    metrics
                        .record_update(
                            &deployment_key,
                            current_label,
                            previous_deployment_key.as_deref(),
                            previous_label.as_deref(),
                        )
                        .await?;
                }
            }
            if let Some(client_unique_id) = &client_unique_id {
                let previous = previous_deployment_key.as_deref().unwrap_or(&deployment_key);
                metrics
                    .remove_deployment_key_client_active_label(previous, client_unique_id)
                    .await?;
            }
            Ok(())
        }
        .await;
        log_dispatch(result, "deploy report (batched)");
    });
}

/// Legacy per-client path: read the stored active label, then conditionally
/// bump counters and move the active-label mapping, keeping the Active
/// increment/decrement pairs matched.
fn dispatch_legacy_deploy(
    state: &AppState,
    deployment_key: &str,
    app_version: &str,
    label: Option<&str>,
    status: Option<DeploymentStatus>,
    client_unique_id: &str,
) {
    let metrics = state.metrics.clone();
    let deployment_key = deployment_key.to_string();
    let app_version = app_version.to_string();
    let label = label.map(str::to_string);
    let client_unique_id = client_unique_id.to_string();

    tokio::spawn(async move {
        let result: CacheResult<()> = async {
            let current_label = metrics
                .get_current_active_label(&deployment_key, &client_unique_id)
                .await?;

            if let Some(label) = &label {
                if current_label.as_deref() != Some(label) {
                    let status = status.unwrap_or(DeploymentStatus::DeploymentSucceeded);
                    metrics
                        .increment_label_status_count(&deployment_key, label, status)
                        .await?;
                    if status == DeploymentStatus::DeploymentSucceeded {
                        metrics
                            .update_active_app_for_client(
                                &deployment_key,
                                &client_unique_id,
                                label,
                                current_label.as_deref(),
                            )
                            .await?;
                    }
                }
            } else if current_label.as_deref() != Some(app_version.as_str()) {
                metrics
                    .update_active_app_for_client(
                        &deployment_key,
                        &client_unique_id,
                        &app_version,
                        current_label.as_deref(),
                    )
                    .await?;
            }
            Ok(())
        }
        .await;
        log_dispatch(result, "deploy report (legacy)");
    });
}

fn require<'a>(value: Option<&'a str>, what: &str) -> ApiResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("A status report must include a valid {what}")))
}

fn log_dispatch(result: CacheResult<()>, what: &str) {
    if let Err(e) = result {
        METRICS_DISPATCH_FAILURES.inc();
        tracing::error!(error = %e, "failed to record {what}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_sdk(version: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SDK_VERSION_HEADER, HeaderValue::from_str(version).unwrap());
        headers
    }

    #[test]
    fn missing_sdk_header_routes_to_legacy() {
        assert!(!sdk_reports_batched_metrics(&HeaderMap::new()));
    }

    #[test]
    fn invalid_sdk_version_routes_to_legacy() {
        assert!(!sdk_reports_batched_metrics(&headers_with_sdk("banana")));
        assert!(!sdk_reports_batched_metrics(&headers_with_sdk("1.5")));
    }

    #[test]
    fn versions_at_or_above_gate_route_to_batched() {
        assert!(sdk_reports_batched_metrics(&headers_with_sdk("1.5.2-beta")));
        assert!(sdk_reports_batched_metrics(&headers_with_sdk("1.5.2")));
        assert!(sdk_reports_batched_metrics(&headers_with_sdk("2.0.0")));
    }

    #[test]
    fn versions_below_gate_route_to_legacy() {
        assert!(!sdk_reports_batched_metrics(&headers_with_sdk("1.5.1")));
        assert!(!sdk_reports_batched_metrics(&headers_with_sdk("1.5.2-alpha")));
        assert!(!sdk_reports_batched_metrics(&headers_with_sdk("1.0.0")));
    }

    #[test]
    fn require_rejects_blank_values() {
        assert!(require(Some("DK"), "deployment key").is_ok());
        assert!(require(Some("   "), "deployment key").is_err());
        assert!(require(None, "deployment key").is_err());
    }
}
