//! Per-release counters over the metrics namespace.
//!
//! Counters are best-effort: the store is not a source of truth for billing,
//! and callers dispatch updates after the HTTP response has gone out. The
//! batched operations use MULTI so that an increment/decrement pair either
//! both apply or neither.

use crate::error::CacheResult;
use crate::manager::RedisManager;
use airlift_core::DeploymentStatus;
use redis::AsyncCommands;
use std::collections::HashMap;

const ACTIVE: &str = "Active";

fn labels_key(deployment_key: &str) -> String {
    format!("deploymentKeyLabels:{deployment_key}")
}

fn clients_key(deployment_key: &str) -> String {
    format!("deploymentKeyClients:{deployment_key}")
}

fn status_field(label: &str, status: DeploymentStatus) -> String {
    format!("{label}:{}", status.as_str())
}

fn active_field(label: &str) -> String {
    format!("{label}:{ACTIVE}")
}

/// Counter operations over the metrics namespace. Cheap to clone; all
/// operations are no-ops against a disabled manager.
#[derive(Clone)]
pub struct MetricsStore {
    redis: RedisManager,
}

impl MetricsStore {
    pub fn new(redis: RedisManager) -> Self {
        Self { redis }
    }

    /// Atomically bump the `label:status` counter for a deployment.
    pub async fn increment_label_status_count(
        &self,
        deployment_key: &str,
        label: &str,
        status: DeploymentStatus,
    ) -> CacheResult<()> {
        let Some(inner) = self.redis.inner() else {
            return Ok(());
        };
        let mut conn = inner.metrics_connection().await?;
        inner
            .timed(conn.hincr::<_, _, _, ()>(
                labels_key(deployment_key),
                status_field(label, status),
                1,
            ))
            .await?;
        Ok(())
    }

    /// Record a successful install of `current_label` in one transaction:
    /// increment its Active and DeploymentSucceeded counters and, when the
    /// client reported where it came from, decrement the previous label's
    /// Active counter.
    pub async fn record_update(
        &self,
        current_deployment_key: &str,
        current_label: &str,
        previous_deployment_key: Option<&str>,
        previous_label: Option<&str>,
    ) -> CacheResult<()> {
        let Some(inner) = self.redis.inner() else {
            return Ok(());
        };
        let current_key = labels_key(current_deployment_key);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hincr(&current_key, active_field(current_label), 1).ignore();
        pipe.hincr(
            &current_key,
            status_field(current_label, DeploymentStatus::DeploymentSucceeded),
            1,
        )
        .ignore();
        if let (Some(prev_key), Some(prev_label)) = (previous_deployment_key, previous_label) {
            pipe.hincr(labels_key(prev_key), active_field(prev_label), -1)
                .ignore();
        }

        let mut conn = inner.metrics_connection().await?;
        inner.timed(pipe.query_async::<()>(&mut conn)).await?;
        Ok(())
    }

    /// Legacy path: move a client's active label and adjust the Active
    /// counters in one transaction.
    pub async fn update_active_app_for_client(
        &self,
        deployment_key: &str,
        client_unique_id: &str,
        to_label: &str,
        from_label: Option<&str>,
    ) -> CacheResult<()> {
        let Some(inner) = self.redis.inner() else {
            return Ok(());
        };
        let labels = labels_key(deployment_key);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset(clients_key(deployment_key), client_unique_id, to_label)
            .ignore();
        pipe.hincr(&labels, active_field(to_label), 1).ignore();
        if let Some(from_label) = from_label {
            pipe.hincr(&labels, active_field(from_label), -1).ignore();
        }

        let mut conn = inner.metrics_connection().await?;
        inner.timed(pipe.query_async::<()>(&mut conn)).await?;
        Ok(())
    }

    /// The label a client last reported as active, if any.
    pub async fn get_current_active_label(
        &self,
        deployment_key: &str,
        client_unique_id: &str,
    ) -> CacheResult<Option<String>> {
        let Some(inner) = self.redis.inner() else {
            return Ok(None);
        };
        let mut conn = inner.metrics_connection().await?;
        let label: Option<String> = inner
            .timed(conn.hget(clients_key(deployment_key), client_unique_id))
            .await?;
        Ok(label)
    }

    /// Forget a client's active label on a deployment.
    pub async fn remove_deployment_key_client_active_label(
        &self,
        deployment_key: &str,
        client_unique_id: &str,
    ) -> CacheResult<()> {
        let Some(inner) = self.redis.inner() else {
            return Ok(());
        };
        let mut conn = inner.metrics_connection().await?;
        inner
            .timed(conn.hdel::<_, _, ()>(clients_key(deployment_key), client_unique_id))
            .await?;
        Ok(())
    }

    /// All counters for a deployment, with string values coerced to integers.
    /// `Ok(None)` when the store is disabled.
    pub async fn get_metrics_with_deployment_key(
        &self,
        deployment_key: &str,
    ) -> CacheResult<Option<HashMap<String, i64>>> {
        let Some(inner) = self.redis.inner() else {
            return Ok(None);
        };
        let mut conn = inner.metrics_connection().await?;
        let raw: HashMap<String, String> =
            inner.timed(conn.hgetall(labels_key(deployment_key))).await?;

        let mut coerced = HashMap::with_capacity(raw.len());
        for (field, value) in raw {
            match value.parse::<i64>() {
                Ok(count) => {
                    coerced.insert(field, count);
                }
                Err(_) => {
                    tracing::warn!(deployment_key, field, value, "non-numeric counter value");
                    coerced.insert(field, 0);
                }
            }
        }
        Ok(Some(coerced))
    }

    /// Drop both the label counters and the client active-label hash for a
    /// deployment.
    pub async fn clear_metrics_for_deployment_key(
        &self,
        deployment_key: &str,
    ) -> CacheResult<()> {
        let Some(inner) = self.redis.inner() else {
            return Ok(());
        };
        let mut conn = inner.metrics_connection().await?;
        inner
            .timed(conn.del::<_, ()>(vec![
                labels_key(deployment_key),
                clients_key(deployment_key),
            ]))
            .await?;
        Ok(())
    }
}
