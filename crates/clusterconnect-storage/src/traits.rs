//! Storage traits for the project storage abstraction layer.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{Project, ProjectFilter, ProjectInput};

/// The authoritative store of projects.
///
/// Implementations must be thread-safe (`Send + Sync`) and are shared by all
/// concurrent requests. Failures are reported as-is; callers do not retry.
///
/// # Example
///
/// ```ignore
/// use clusterconnect_storage::{ProjectStorage, StorageError, Project};
///
/// async fn get_project(storage: &dyn ProjectStorage, id: i32) -> Result<Project, StorageError> {
///     storage
///         .get_by_id(id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(id))
/// }
/// ```
#[async_trait]
pub trait ProjectStorage: Send + Sync {
    /// Reads a project by ID.
    ///
    /// Returns `None` if the project does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing projects.
    async fn get_by_id(&self, id: i32) -> Result<Option<Project>, StorageError>;

    /// Returns every project, newest first.
    async fn get_all(&self) -> Result<Vec<Project>, StorageError>;

    /// Returns the projects matching `filter`, newest first.
    async fn get_by_filter(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StorageError>;

    /// Persists a new project and assigns its identity and creation time.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidProject` if the input is rejected by the backend.
    async fn insert(&self, input: &ProjectInput) -> Result<Project, StorageError>;

    /// Replaces every mutable field of an existing project.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the project does not exist.
    async fn overwrite(&self, id: i32, input: &ProjectInput) -> Result<Project, StorageError>;

    /// Removes a project.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the project does not exist.
    async fn remove(&self, id: i32) -> Result<(), StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
