//! Project read caching.
//!
//! Caches projects and the unfiltered project listing to avoid database
//! round-trips for reads. Uses the `CacheBackend` (disabled, local or Redis).
//!
//! ## Cache Key Format
//!
//! - `project:{id}`: a single project, e.g. `project:42`
//! - `projects:all`: the full listing, newest first
//!
//! Filtered listings are never cached.
//!
//! Values are MessagePack. A value that fails to decode is treated as a miss
//! and its key is invalidated.

use std::time::Duration;

use clusterconnect_storage::Project;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::backend::{CacheBackend, CacheStats};
use crate::config::CacheConfig;
use crate::metrics;

/// Key of the cached unfiltered listing.
pub const LIST_KEY: &str = "projects:all";

/// Project read cache.
#[derive(Debug, Clone)]
pub struct ProjectCache {
    backend: CacheBackend,
    project_ttl: Duration,
    list_ttl: Duration,
}

impl ProjectCache {
    /// Create a new project cache with the given backend and TTLs.
    pub fn new(backend: CacheBackend, project_ttl: Duration, list_ttl: Duration) -> Self {
        Self {
            backend,
            project_ttl,
            list_ttl,
        }
    }

    /// Create a project cache with TTLs taken from configuration.
    pub fn from_config(backend: CacheBackend, config: &CacheConfig) -> Self {
        Self::new(backend, config.project_ttl(), config.list_ttl())
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self::new(CacheBackend::disabled(), Duration::ZERO, Duration::ZERO)
    }

    /// Generate cache key for a project.
    #[inline]
    pub fn project_key(id: i32) -> String {
        format!("project:{id}")
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    pub fn project_ttl(&self) -> Duration {
        self.project_ttl
    }

    pub fn list_ttl(&self) -> Duration {
        self.list_ttl
    }

    /// Get a cached project by ID.
    pub async fn get_project(&self, id: i32) -> Option<Project> {
        self.get_decoded(&Self::project_key(id)).await
    }

    /// Cache a project after a successful store read.
    pub async fn set_project(&self, project: &Project) {
        self.set_encoded(&Self::project_key(project.id), project, self.project_ttl)
            .await;
    }

    /// Get the cached unfiltered listing.
    pub async fn get_list(&self) -> Option<Vec<Project>> {
        self.get_decoded(LIST_KEY).await
    }

    /// Cache the unfiltered listing after a successful store read.
    pub async fn set_list(&self, projects: &[Project]) {
        self.set_encoded(LIST_KEY, projects, self.list_ttl).await;
    }

    /// Invalidate a cached project.
    pub async fn invalidate_project(&self, id: i32) {
        self.backend.invalidate(&Self::project_key(id)).await;
    }

    /// Invalidate the cached listing.
    pub async fn invalidate_list(&self) {
        self.backend.invalidate(LIST_KEY).await;
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.backend.stats()
    }

    async fn get_decoded<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.backend.get(key).await?;
        match rmp_serde::from_slice::<T>(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize cached value");
                metrics::record_cache_error("decode");
                self.backend.invalidate(key).await;
                None
            }
        }
    }

    async fn set_encoded<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match rmp_serde::to_vec(value) {
            Ok(data) => {
                self.backend.set(key, data, ttl).await;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize value for cache");
                metrics::record_cache_error("encode");
            }
        }
    }
}
