//! Update-check endpoints (the tiered read path).
//!
//! Microcache -> distributed cache -> storage, selection engine after the
//! cache tiers, diff substitution and proxy rewrite at finalization, and
//! write-back only after the response value is produced so the client never
//! waits on cache latency.

use crate::error::{ApiError, ApiResult};
use crate::metrics::{CACHE_READ_ERRORS, UPDATE_CHECKS_TOTAL};
use crate::state::AppState;
use crate::wire::{
    LegacyUpdateCheckBody, ResponseShape, SnakeUpdateCheckBody, UpdateCheckQuery, parse_bool_flag,
};
use airlift_core::{
    AcquisitionRequest, CACHE_SCHEMA_VERSION, CacheableBody, CacheableResponse,
    DEPLOYMENT_KEY_PREFIX, DiffPackageMap, Release, Selection, acquisition_cache_key, finalize,
    is_satisfiable_range, normalize_app_version, select_update,
};
use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use semver::Version;

/// Which tier supplied the response body, for observability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CacheTier {
    Micro,
    Distributed,
    Storage,
}

impl CacheTier {
    fn as_str(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Distributed => "distributed",
            Self::Storage => "storage",
        }
    }
}

/// GET /updateCheck - legacy-shape update check.
pub async fn update_check_legacy(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<UpdateCheckQuery>,
) -> ApiResult<Response> {
    update_check(state, uri, query, ResponseShape::Legacy).await
}

/// GET /v0.1/public/codepush/update_check - new-shape update check.
pub async fn update_check_v1(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<UpdateCheckQuery>,
) -> ApiResult<Response> {
    update_check(state, uri, query, ResponseShape::Snake).await
}

async fn update_check(
    state: AppState,
    uri: axum::http::Uri,
    query: UpdateCheckQuery,
    shape: ResponseShape,
) -> ApiResult<Response> {
    let request = parse_update_request(&query)?;

    let distributed_key = format!("{DEPLOYMENT_KEY_PREFIX}{}", request.deployment_key);
    let original_url = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let url_key = acquisition_cache_key(original_url, CACHE_SCHEMA_VERSION);
    let mem_key = format!("{distributed_key}|{url_key}");

    // Tier 1: microcache.
    let (cacheable, tier) = match state.response_microcache.get(&mem_key) {
        Some(cached) => (cached, CacheTier::Micro),
        None => {
            // Tier 2: distributed cache; errors degrade to a miss.
            let distributed = match state.redis.get_cached_response(&distributed_key, &url_key).await
            {
                Ok(found) => found,
                Err(e) => {
                    CACHE_READ_ERRORS.inc();
                    tracing::warn!(key = %distributed_key, error = %e, "distributed cache read failed");
                    None
                }
            };
            match distributed {
                Some(cached) => (cached, CacheTier::Distributed),
                // Tier 3: release-history storage.
                None => (load_cacheable_response(&state, &request).await?, CacheTier::Storage),
            }
        }
    };

    let now_ms = epoch_ms();
    let selection = select_update(&cacheable.body.releases, &request, now_ms);

    let diff_map = match (&selection, &request.package_hash) {
        (Selection::Update { release, .. }, Some(_)) => {
            fetch_diff_map(&state, &request.deployment_key, release).await
        }
        _ => None,
    };

    let mut info = finalize(&selection, &request, diff_map.as_ref());
    if let (Some(proxy), Some(download_url)) = (&state.proxy, &info.download_url) {
        info.download_url = Some(proxy.rewrite(download_url));
    }

    UPDATE_CHECKS_TOTAL.with_label_values(&[tier.as_str()]).inc();
    tracing::debug!(
        deployment_key = %request.deployment_key,
        tier = tier.as_str(),
        from_cache = tier != CacheTier::Storage,
        is_available = info.is_available,
        "update check answered"
    );

    let status =
        StatusCode::from_u16(cacheable.status_code).unwrap_or(StatusCode::OK);
    let response = match shape {
        ResponseShape::Snake => {
            (status, Json(SnakeUpdateCheckBody { update_info: info })).into_response()
        }
        ResponseShape::Legacy => (
            status,
            Json(LegacyUpdateCheckBody {
                update_info: info.into(),
            }),
        )
            .into_response(),
    };

    // Write-back is sequenced after the response value exists; the client
    // never waits on it. Concurrent requests may race to populate the same
    // fingerprint - the cache is an optimization, not a lock.
    let write_distributed = tier == CacheTier::Storage;
    if tier != CacheTier::Micro {
        let state = state.clone();
        tokio::spawn(async move {
            state.response_microcache.set(mem_key, cacheable.clone());
            if write_distributed {
                state
                    .redis
                    .set_cached_response(&distributed_key, &url_key, &cacheable)
                    .await;
            }
        });
    }

    Ok(response)
}

/// Validate the raw query into an [`AcquisitionRequest`].
fn parse_update_request(query: &UpdateCheckQuery) -> ApiResult<AcquisitionRequest> {
    let deployment_key = query
        .deployment_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("An update check must include a valid deployment key".to_string())
        })?;

    let raw_app_version = query
        .app_version
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("An update check must include a valid app version".to_string())
        })?;

    let normalized_app_version = normalize_app_version(raw_app_version);
    if Version::parse(&normalized_app_version).is_err() {
        return Err(ApiError::BadRequest(format!(
            "An update check must include a valid semver app version; got: {raw_app_version}"
        )));
    }

    Ok(AcquisitionRequest {
        deployment_key: deployment_key.to_string(),
        raw_app_version: raw_app_version.to_string(),
        normalized_app_version,
        client_unique_id: query.client_unique_id.clone(),
        package_hash: query.package_hash.clone(),
        label: query.label.clone(),
        is_companion: parse_bool_flag(query.is_companion.as_deref()),
        beta: parse_bool_flag(query.beta.as_deref()),
    })
}

/// Fetch the release history and build the cacheable response, priming the
/// distributed diff-map cache for every release that carries one.
async fn load_cacheable_response(
    state: &AppState,
    request: &AcquisitionRequest,
) -> ApiResult<CacheableResponse> {
    let history = state
        .storage
        .get_package_history(&request.deployment_key)
        .await?;
    let cacheable = build_cacheable_response(history);

    for release in &cacheable.body.releases {
        if !release.diff_package_map.is_empty() {
            state
                .redis
                .set_diff_package_map(
                    &request.deployment_key,
                    &release.package_hash,
                    &release.diff_package_map,
                )
                .await;
        }
    }

    Ok(cacheable)
}

/// Pre-filter the history to releases whose binary range could match some
/// request. Malformed ranges can never satisfy any version, so they are
/// dropped here rather than re-evaluated per client.
fn build_cacheable_response(history: Vec<Release>) -> CacheableResponse {
    let releases = history
        .into_iter()
        .filter(|release| is_satisfiable_range(&release.app_version))
        .collect();
    CacheableResponse {
        status_code: 200,
        body: CacheableBody { releases },
    }
}

/// Resolve the diff map for the selected release: diff microcache first, then
/// the distributed cache (memoizing hits), then the release's own embedded
/// map. Any fetch failure is logged and ignored - the full bundle stands.
async fn fetch_diff_map(
    state: &AppState,
    deployment_key: &str,
    release: &Release,
) -> Option<DiffPackageMap> {
    let mem_key = format!("{deployment_key}:{}", release.package_hash);
    if let Some(map) = state.diff_microcache.get(&mem_key) {
        return Some(map);
    }

    match state
        .redis
        .get_diff_package_map(deployment_key, &release.package_hash)
        .await
    {
        Ok(Some(map)) => {
            state.diff_microcache.set(mem_key, map.clone());
            return Some(map);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(
                deployment_key,
                package_hash = %release.package_hash,
                error = %e,
                "diff-map fetch failed, serving full bundle"
            );
        }
    }

    if release.diff_package_map.is_empty() {
        None
    } else {
        Some(release.diff_package_map.clone())
    }
}

fn epoch_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
