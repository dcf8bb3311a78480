//! Cache backend: disabled, in-process (DashMap), or Redis.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::metrics;

/// A cached entry with TTL support.
///
/// The data is wrapped in `Arc` to allow cheap cloning on cache hits.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub data: Arc<Vec<u8>>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    /// Create a new cached entry.
    pub fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data: Arc::new(data),
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Failure talking to the cache backend.
///
/// Never leaves this module: every variant is logged and turned into a miss
/// or a dropped write.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to get Redis connection: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Key-value cache with per-key expiry.
///
/// ## Cache Modes
///
/// - **Disabled**: no cache configured; every `get` misses, writes are dropped
/// - **Local**: single-instance mode using only DashMap
/// - **Redis**: shared cache across instances; every operation is bounded by
///   `op_timeout`
///
/// All three answer the same contract, so callers never branch on whether a
/// cache exists or is healthy: an unreachable backend, a timeout and an absent
/// key all look like a miss, and `set`/`invalidate` are best-effort.
#[derive(Clone)]
pub enum CacheBackend {
    /// No cache configured
    Disabled,

    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, CachedEntry>>),

    /// Multi-instance: Redis
    Redis { pool: Pool, op_timeout: Duration },
}

impl std::fmt::Debug for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBackend")
            .field("mode", &self.mode())
            .finish()
    }
}

impl CacheBackend {
    /// Create a backend that caches nothing.
    pub fn disabled() -> Self {
        CacheBackend::Disabled
    }

    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(pool: Pool, op_timeout: Duration) -> Self {
        CacheBackend::Redis { pool, op_timeout }
    }

    /// Short name of the active mode.
    pub fn mode(&self) -> &'static str {
        match self {
            CacheBackend::Disabled => "disabled",
            CacheBackend::Local(_) => "local",
            CacheBackend::Redis { .. } => "redis",
        }
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` when the key is absent or expired, and also when the
    /// backend is unreachable or does not answer within the operation timeout.
    pub async fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        match self {
            CacheBackend::Disabled => None,
            CacheBackend::Local(map) => {
                if let Some(entry) = map.get(key)
                    && !entry.is_expired()
                {
                    tracing::debug!(key = %key, "cache hit (local)");
                    metrics::record_cache_hit("local");
                    return Some(Arc::clone(&entry.data));
                }
                evict_if_expired(map, key);
                tracing::debug!(key = %key, "cache miss");
                metrics::record_cache_miss();
                None
            }
            CacheBackend::Redis { pool, op_timeout } => {
                let result = bounded(*op_timeout, async {
                    let mut conn = pool.get().await?;
                    Ok::<_, CacheError>(conn.get::<_, Option<Vec<u8>>>(key).await?)
                })
                .await;

                match result {
                    Ok(Some(data)) => {
                        tracing::debug!(key = %key, "cache hit (redis)");
                        metrics::record_cache_hit("redis");
                        Some(Arc::new(data))
                    }
                    Ok(None) => {
                        tracing::debug!(key = %key, "cache miss");
                        metrics::record_cache_miss();
                        None
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis GET failed, treating as miss");
                        metrics::record_cache_error("get");
                        metrics::record_cache_miss();
                        None
                    }
                }
            }
        }
    }

    /// Set a value in the cache with TTL, overwriting any previous value.
    ///
    /// Best-effort: failures are logged and counted, never returned.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        match self {
            CacheBackend::Disabled => {}
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), CachedEntry::new(value, ttl));
                metrics::set_cache_entries(map.len());
            }
            CacheBackend::Redis { pool, op_timeout } => {
                // Redis rejects a zero expiry; sub-millisecond TTLs round up.
                let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                let result = bounded(*op_timeout, async {
                    let mut conn = pool.get().await?;
                    conn.pset_ex::<_, _, ()>(key, value.as_slice(), ttl_ms)
                        .await?;
                    Ok::<_, CacheError>(())
                })
                .await;

                match result {
                    Ok(()) => tracing::debug!(key = %key, ttl_ms = %ttl_ms, "cache set (redis)"),
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "Redis SET failed");
                        metrics::record_cache_error("set");
                    }
                }
            }
        }
    }

    /// Invalidate a cache entry.
    ///
    /// Best-effort and idempotent: deleting an absent key is not an error.
    pub async fn invalidate(&self, key: &str) {
        match self {
            CacheBackend::Disabled => {}
            CacheBackend::Local(map) => {
                if map.remove(key).is_some() {
                    metrics::set_cache_entries(map.len());
                }
                tracing::debug!(key = %key, "cache invalidated (local)");
            }
            CacheBackend::Redis { pool, op_timeout } => {
                let result = bounded(*op_timeout, async {
                    let mut conn = pool.get().await?;
                    conn.del::<_, ()>(key).await?;
                    Ok::<_, CacheError>(())
                })
                .await;

                match result {
                    Ok(()) => tracing::debug!(key = %key, "cache invalidated (redis)"),
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "Redis DEL failed, entry may stay stale until its TTL lapses"
                        );
                        metrics::record_cache_error("delete");
                    }
                }
            }
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            local_entries: self.local_cache().map_or(0, |map| map.len()),
            mode: self.mode().to_string(),
        }
    }

    /// Check if the backend can currently serve requests (for health checks).
    pub async fn is_available(&self) -> bool {
        match self {
            CacheBackend::Disabled => false,
            CacheBackend::Local(_) => true,
            CacheBackend::Redis { pool, op_timeout } => {
                bounded(*op_timeout, async {
                    let mut conn = pool.get().await?;
                    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
                    Ok::<_, CacheError>(())
                })
                .await
                .is_ok()
            }
        }
    }

    /// Get the local cache reference (for testing/internal use).
    pub fn local_cache(&self) -> Option<&Arc<DashMap<String, CachedEntry>>> {
        match self {
            CacheBackend::Local(map) => Some(map),
            _ => None,
        }
    }
}

/// Removes `key` only while it still holds an expired entry, so a fresh value
/// written concurrently survives.
fn evict_if_expired(map: &DashMap<String, CachedEntry>, key: &str) {
    if map.remove_if(key, |_, entry| entry.is_expired()).is_some() {
        metrics::set_cache_entries(map.len());
    }
}

/// Runs a cache operation under a deadline.
async fn bounded<T>(
    timeout: Duration,
    op: impl Future<Output = Result<T, CacheError>>,
) -> Result<T, CacheError> {
    tokio::time::timeout(timeout, op)
        .await
        .map_err(|_| CacheError::Timeout(timeout))?
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub local_entries: usize,
    pub mode: String,
}
