//! # clusterconnect-storage
//!
//! Storage abstraction layer for ClusterConnect projects.
//!
//! This crate defines the traits and types that all project storage backends
//! must implement. It does not contain any implementations - those are
//! provided by `clusterconnect-db-memory` and `clusterconnect-db-postgres`.
//!
//! ## Overview
//!
//! The main trait is [`ProjectStorage`], the system of record for:
//! - lookups by id and the unfiltered listing (newest first)
//! - filtered listings via [`ProjectFilter`]
//! - insert, overwrite and remove
//!
//! ## Example
//!
//! ```ignore
//! use clusterconnect_storage::{ProjectFilter, ProjectStorage, StorageError, Project};
//!
//! async fn active_projects(storage: &dyn ProjectStorage) -> Result<Vec<Project>, StorageError> {
//!     storage.get_by_filter(&ProjectFilter::by_status("ACTIVE")).await
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::ProjectStorage;
pub use types::{
    MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, MAX_STATUS_LEN, MAX_TECH_STACK_LEN, MAX_TITLE_LEN,
    Project, ProjectFilter, ProjectInput, sort_newest_first, status,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynProjectStorage = std::sync::Arc<dyn ProjectStorage>;
