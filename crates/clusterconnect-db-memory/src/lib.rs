//! In-memory project storage backend for ClusterConnect.
//!
//! This crate provides an in-memory implementation of the `ProjectStorage`
//! trait from `clusterconnect-storage`, using papaya lock-free HashMap for
//! concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use clusterconnect_db_memory::InMemoryProjectStorage;
//! use clusterconnect_storage::{ProjectInput, ProjectStorage};
//!
//! let storage = InMemoryProjectStorage::new();
//! let created = storage.insert(&ProjectInput::new("Cluster dashboard")).await?;
//! assert_eq!(created.id, 1);
//! ```

mod storage;

pub use clusterconnect_storage::{ProjectStorage, StorageError};
pub use storage::InMemoryProjectStorage;

/// Creates a new shareable in-memory storage instance.
pub fn create_project_storage() -> clusterconnect_storage::DynProjectStorage {
    std::sync::Arc::new(InMemoryProjectStorage::new())
}
