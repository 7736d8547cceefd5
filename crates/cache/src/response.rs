//! Distributed response cache and diff-map cache (ops namespace).
//!
//! Responses are stored as a hash per deployment: key `deploymentKey:<D>`,
//! field = canonical URL key, value = serialized [`CacheableResponse`]. Diff
//! maps are stored under their own string keys so selection-engine runs can
//! hydrate diff payloads without reloading full release histories.
//!
//! Degradation contract: read errors are reported to the caller (who treats
//! them as misses); write errors are logged and swallowed here, since the
//! request they belong to has already been answered.

use crate::error::CacheResult;
use crate::manager::RedisManager;
use airlift_core::{CacheableResponse, DiffPackageMap};
use redis::AsyncCommands;

fn diff_map_key(deployment_key: &str, package_hash: &str) -> String {
    format!("diffPackageMap:{deployment_key}:{package_hash}")
}

impl RedisManager {
    /// Look up a cached response. `Ok(None)` on miss or when disabled.
    pub async fn get_cached_response(
        &self,
        deployment_key_id: &str,
        url_key: &str,
    ) -> CacheResult<Option<CacheableResponse>> {
        let Some(inner) = self.inner() else {
            return Ok(None);
        };
        let mut conn = inner.ops.clone();
        let raw: Option<String> = inner.timed(conn.hget(deployment_key_id, url_key)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store a response. The first write to a deployment's key also sets its
    /// expiry; later writes never extend it, so a deployment's cache entries
    /// age out as one unit.
    pub async fn set_cached_response(
        &self,
        deployment_key_id: &str,
        url_key: &str,
        response: &CacheableResponse,
    ) {
        let Some(inner) = self.inner() else {
            return;
        };
        let result: CacheResult<()> = async {
            let json = serde_json::to_string(response)?;
            let mut conn = inner.ops.clone();
            inner
                .timed(conn.hset::<_, _, _, ()>(deployment_key_id, url_key, json))
                .await?;
            let ttl: i64 = inner.timed(conn.ttl(deployment_key_id)).await?;
            if ttl < 0 {
                inner
                    .timed(conn.expire::<_, ()>(deployment_key_id, inner.response_ttl_secs as i64))
                    .await?;
            }
            Ok(())
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(key = deployment_key_id, error = %e, "response cache write failed");
        }
    }

    /// Drop every cached response for a deployment. Called by the management
    /// surface when a deployment mutates.
    pub async fn invalidate_cache_for_deployment(&self, deployment_key_id: &str) -> CacheResult<()> {
        let Some(inner) = self.inner() else {
            return Ok(());
        };
        let mut conn = inner.ops.clone();
        inner.timed(conn.del::<_, ()>(deployment_key_id)).await?;
        Ok(())
    }

    /// Look up the diff map for a release. `Ok(None)` on miss or when
    /// disabled; never raises a miss to callers as an error.
    pub async fn get_diff_package_map(
        &self,
        deployment_key: &str,
        package_hash: &str,
    ) -> CacheResult<Option<DiffPackageMap>> {
        let Some(inner) = self.inner() else {
            return Ok(None);
        };
        let mut conn = inner.ops.clone();
        let raw: Option<String> = inner
            .timed(conn.get(diff_map_key(deployment_key, package_hash)))
            .await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store the diff map for a release with the diff-map TTL. Errors are
    /// logged and swallowed.
    pub async fn set_diff_package_map(
        &self,
        deployment_key: &str,
        package_hash: &str,
        diff_map: &DiffPackageMap,
    ) {
        let Some(inner) = self.inner() else {
            return;
        };
        let result: CacheResult<()> = async {
            let json = serde_json::to_string(diff_map)?;
            let mut conn = inner.ops.clone();
            inner
                .timed(conn.set_ex::<_, _, ()>(
                    diff_map_key(deployment_key, package_hash),
                    json,
                    inner.diff_map_ttl_secs,
                ))
                .await?;
            Ok(())
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(
                deployment_key,
                package_hash,
                error = %e,
                "diff-map cache write failed"
            );
        }
    }
}
