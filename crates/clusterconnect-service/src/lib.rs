//! # clusterconnect-service
//!
//! Project CRUD over an authoritative store with a best-effort cache-aside
//! layer in front of it.
//!
//! The store is any [`ProjectStorage`](clusterconnect_storage::ProjectStorage)
//! backend (PostgreSQL or in-memory). The cache is optional: without a Redis
//! address the service reads and writes the store directly.
//!
//! ## Example
//!
//! ```ignore
//! use clusterconnect_service::{build_project_service, config::loader::load_config};
//! use clusterconnect_storage::ProjectInput;
//!
//! let config = load_config(None)?;
//! let service = build_project_service(&config).await?;
//! let created = service.create(&ProjectInput::new("Cluster dashboard")).await?;
//! let read = service.get_by_id(created.id).await?;
//! ```

pub mod cache;
pub mod config;
pub mod metrics;
pub mod observability;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use clusterconnect_db_postgres::PostgresProjectStorage;
use clusterconnect_storage::{DynProjectStorage, StorageError};

pub use cache::{CacheBackend, CacheStats, LIST_KEY, ProjectCache};
pub use config::{AppConfig, CacheConfig, LoggingConfig, RedisConfig, StorageBackend, StorageConfig};
pub use observability::{
    apply_logging_config, apply_logging_level, init_tracing, init_tracing_with_level,
};
pub use service::ProjectService;

/// Errors raised while wiring the service at startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to open project storage: {0}")]
    Storage(#[from] StorageError),
}

/// Create a cache backend based on configuration.
///
/// ## Cache Modes
///
/// - **No Redis URL**: caching disabled, or local-only (DashMap) when
///   `cache.local_fallback` is set
/// - **Redis URL**: shared Redis cache, every operation bounded by
///   `cache.operation_timeout_ms`
///
/// ## Graceful Degradation
///
/// An unusable Redis URL disables caching. An unreachable Redis server is only
/// logged: the backend is kept, each operation degrades to a miss, and caching
/// resumes by itself once the server answers again.
pub async fn create_cache_backend(redis: &RedisConfig, cache: &CacheConfig) -> CacheBackend {
    let Some(url) = redis.url() else {
        if cache.local_fallback {
            tracing::info!("Redis not configured, using local cache only");
            return CacheBackend::new_local();
        }
        tracing::info!("Redis not configured, caching disabled");
        return CacheBackend::disabled();
    };

    tracing::info!(url = %mask_url(url), "Connecting to Redis");

    // Create Redis pool configuration
    let timeout = Duration::from_millis(redis.timeout_ms);
    let mut redis_config = deadpool_redis::Config::from_url(url);
    let mut pool_config = deadpool_redis::PoolConfig::new(redis.pool_size);
    pool_config.timeouts.wait = Some(timeout);
    pool_config.timeouts.create = Some(timeout);
    pool_config.timeouts.recycle = Some(timeout);
    redis_config.pool = Some(pool_config);

    // Create pool
    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create Redis pool. Caching disabled.");
            return CacheBackend::disabled();
        }
    };

    let backend = CacheBackend::new_redis(pool, cache.operation_timeout());

    // Test connection
    if backend.is_available().await {
        tracing::info!("Connected to Redis successfully");
    } else {
        tracing::warn!("Redis is not reachable. Reads fall back to the store until it recovers.");
    }

    backend
}

/// Opens the configured project store.
pub async fn create_project_storage(config: &StorageConfig) -> Result<DynProjectStorage, BootstrapError> {
    match config.backend {
        StorageBackend::Postgres => {
            let storage = PostgresProjectStorage::new(&config.postgres).await?;
            tracing::info!(backend = "postgres", "Project storage ready");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            tracing::info!(backend = "memory", "Project storage ready (non-durable)");
            Ok(clusterconnect_db_memory::create_project_storage())
        }
    }
}

/// Wires storage, cache and service from configuration.
pub async fn build_project_service(config: &AppConfig) -> Result<ProjectService, BootstrapError> {
    config.validate().map_err(BootstrapError::Config)?;
    if observability::apply_logging_config(&config.logging) {
        tracing::debug!(level = %config.logging.level, "Applied configured log level");
    }

    let storage = create_project_storage(&config.storage).await?;
    let backend = create_cache_backend(&config.redis, &config.cache).await;
    tracing::info!(
        storage = storage.backend_name(),
        cache = backend.mode(),
        project_ttl_secs = config.cache.project_ttl_secs,
        list_ttl_secs = config.cache.list_ttl_secs,
        "Project service initialized"
    );

    Ok(ProjectService::new(
        storage,
        ProjectCache::from_config(backend, &config.cache),
    ))
}

/// Masks the password of a Redis URL for logging.
fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@')
        && let Some(colon_pos) = url[..at_pos].rfind(':')
    {
        let scheme_end = url.find("://").map_or(0, |p| p + 3);
        if colon_pos > scheme_end {
            return format!("{}:****{}", &url[..colon_pos], &url[at_pos..]);
        }
    }
    url.to_string()
}
