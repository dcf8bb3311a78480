//! Cache-aside project service.
//!
//! Reads consult the cache first and fall back to the store on a miss,
//! repopulating the cache with a bounded TTL. Writes always go to the store
//! first; only after the store accepts a write are the keys it could have
//! made stale invalidated.
//!
//! Callers see the same values and the same errors whether or not a cache is
//! configured, and whether or not it is healthy.

use clusterconnect_storage::{
    DynProjectStorage, Project, ProjectFilter, ProjectInput, StorageError, StorageResult,
};
use tracing::{debug, error, info};

use crate::cache::ProjectCache;
use crate::metrics;

/// Coordinates the project store and the project cache.
///
/// Cheap to clone; every clone shares the same store and cache handles.
#[derive(Clone)]
pub struct ProjectService {
    storage: DynProjectStorage,
    cache: ProjectCache,
}

impl std::fmt::Debug for ProjectService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectService")
            .field("storage", &self.storage.backend_name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl ProjectService {
    pub fn new(storage: DynProjectStorage, cache: ProjectCache) -> Self {
        Self { storage, cache }
    }

    /// A service that reads and writes the store directly.
    pub fn without_cache(storage: DynProjectStorage) -> Self {
        Self::new(storage, ProjectCache::disabled())
    }

    pub fn storage(&self) -> &DynProjectStorage {
        &self.storage
    }

    pub fn cache(&self) -> &ProjectCache {
        &self.cache
    }

    /// Returns a project by ID.
    ///
    /// A missing project is reported as `NotFound` and is never cached, so a
    /// project created later is visible on the next read.
    pub async fn get_by_id(&self, id: i32) -> StorageResult<Project> {
        if let Some(project) = self.cache.get_project(id).await {
            return Ok(project);
        }

        let found = observe("get_by_id", self.storage.get_by_id(id).await)?;
        let project = found.ok_or_else(|| StorageError::not_found(id))?;
        self.cache.set_project(&project).await;
        Ok(project)
    }

    /// Returns every project, newest first.
    pub async fn get_all(&self) -> StorageResult<Vec<Project>> {
        if let Some(projects) = self.cache.get_list().await {
            return Ok(projects);
        }

        let projects = observe("get_all", self.storage.get_all().await)?;
        self.cache.set_list(&projects).await;
        Ok(projects)
    }

    /// Returns the projects matching `filter`, newest first. Never cached.
    pub async fn get_by_filter(&self, filter: &ProjectFilter) -> StorageResult<Vec<Project>> {
        observe("get_by_filter", self.storage.get_by_filter(filter).await)
    }

    /// Creates a project.
    pub async fn create(&self, input: &ProjectInput) -> StorageResult<Project> {
        input.validate()?;

        let project = observe("insert", self.storage.insert(input).await)?;
        self.cache.invalidate_list().await;

        info!(id = project.id, title = %project.title, "project created");
        Ok(project)
    }

    /// Replaces every mutable field of a project.
    pub async fn update(&self, id: i32, input: &ProjectInput) -> StorageResult<Project> {
        input.validate()?;

        let project = observe("overwrite", self.storage.overwrite(id, input).await)?;
        self.invalidate(id).await;

        info!(id, title = %project.title, "project updated");
        Ok(project)
    }

    /// Deletes a project.
    pub async fn delete(&self, id: i32) -> StorageResult<()> {
        observe("remove", self.storage.remove(id).await)?;
        self.invalidate(id).await;

        info!(id, "project deleted");
        Ok(())
    }

    async fn invalidate(&self, id: i32) {
        self.cache.invalidate_project(id).await;
        self.cache.invalidate_list().await;
        debug!(id, "cache keys invalidated");
    }
}

/// Counts a store call and logs infrastructure failures before they are
/// surfaced to the caller.
fn observe<T>(op: &'static str, result: StorageResult<T>) -> StorageResult<T> {
    match &result {
        Ok(_) => metrics::record_store_operation(op, "ok"),
        Err(e) => {
            metrics::record_store_operation(op, e.category().as_str());
            if !e.is_not_found() && !e.is_invalid() {
                error!(op, error = %e, "store operation failed");
            }
        }
    }
    result
}
