//! Redis connection management for the distributed cache tiers.
//!
//! Two logical namespaces share one endpoint: the ops database holds cached
//! responses and diff maps, the metrics database holds per-release counters.
//! Keeping counters in a distinct logical database isolates their eviction
//! behavior from response caching.
//!
//! The manager is a process-wide singleton handed to every handler. Absent
//! host configuration puts it into a disabled state where every operation
//! returns a null/no-op result without error.

use crate::error::{CacheError, CacheResult};
use airlift_core::config::{CacheConfig, RedisConfig};
use redis::aio::ConnectionManager;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Logical database holding cached responses and diff maps.
const OPS_DB: i64 = 0;
/// Logical database holding metric counters.
const METRICS_DB: i64 = 1;

pub(crate) struct RedisInner {
    /// Ops-namespace connection, established at startup.
    pub(crate) ops: ConnectionManager,
    /// Client for the metrics namespace; the connection (and with it the
    /// database selection) is established once, on first use.
    metrics_client: redis::Client,
    metrics: OnceCell<ConnectionManager>,
    op_timeout: Duration,
    pub(crate) response_ttl_secs: u64,
    pub(crate) diff_map_ttl_secs: u64,
}

impl RedisInner {
    /// Run a cache command under the per-op timeout.
    pub(crate) async fn timed<T, F>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout),
        }
    }

    /// The metrics-namespace connection. Selecting the metrics database is a
    /// one-time initialization every metrics op awaits; concurrent callers
    /// share the single attempt.
    pub(crate) async fn metrics_connection(&self) -> CacheResult<ConnectionManager> {
        let conn = self
            .metrics
            .get_or_try_init(|| async {
                self.metrics_client.get_connection_manager().await
            })
            .await?;
        Ok(conn.clone())
    }
}

/// Shared handle to the distributed cache. Cheap to clone.
#[derive(Clone)]
pub struct RedisManager {
    inner: Option<Arc<RedisInner>>,
}

impl RedisManager {
    /// A manager with no backing store: every operation is a null/no-op.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Connect to the configured endpoint, or return a disabled manager when
    /// no host is configured. Connection or configuration failures with a
    /// host present are fatal: the caller should refuse to start.
    pub async fn from_config(redis: &RedisConfig, cache: &CacheConfig) -> CacheResult<Self> {
        let Some(host) = redis.host.clone() else {
            tracing::info!("no cache host configured, distributed cache disabled");
            return Ok(Self::disabled());
        };

        let ops_client = redis::Client::open(connection_info(&host, redis, OPS_DB))?;
        let ops = ops_client.get_connection_manager().await?;
        let metrics_client = redis::Client::open(connection_info(&host, redis, METRICS_DB))?;
        tracing::info!(host = %host, port = redis.port, tls = redis.key.is_some(), "connected to distributed cache");

        Ok(Self {
            inner: Some(Arc::new(RedisInner {
                ops,
                metrics_client,
                metrics: OnceCell::new(),
                op_timeout: redis.op_timeout(),
                response_ttl_secs: cache.response_ttl_secs,
                diff_map_ttl_secs: cache.diff_map_ttl_secs,
            })),
        })
    }

    /// Whether a backing store is configured.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub(crate) fn inner(&self) -> Option<&Arc<RedisInner>> {
        self.inner.as_ref()
    }

    /// Check cache connectivity. A disabled manager is vacuously healthy.
    pub async fn health_check(&self) -> CacheResult<()> {
        let Some(inner) = self.inner() else {
            return Ok(());
        };
        let mut conn = inner.ops.clone();
        inner
            .timed(redis::cmd("PING").query_async::<String>(&mut conn))
            .await?;
        Ok(())
    }
}

fn connection_info(host: &str, config: &RedisConfig, db: i64) -> ConnectionInfo {
    // An auth key implies a managed endpoint: TLS with strict CA verification.
    let addr = if config.key.is_some() {
        ConnectionAddr::TcpTls {
            host: host.to_string(),
            port: config.port,
            insecure: false,
            tls_params: None,
        }
    } else {
        ConnectionAddr::Tcp(host.to_string(), config.port)
    };
    ConnectionInfo {
        addr,
        redis: RedisConnectionInfo {
            db,
            username: None,
            password: config.key.clone(),
            ..Default::default()
        },
    }
}
