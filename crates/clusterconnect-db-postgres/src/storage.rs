//! PostgreSQL implementation of the ProjectStorage trait.

use async_trait::async_trait;
use sqlx_postgres::PgPool;

use clusterconnect_storage::{Project, ProjectFilter, ProjectInput, ProjectStorage, StorageError};

use crate::config::PostgresConfig;
use crate::pool;
use crate::queries;

/// PostgreSQL storage backend for projects.
///
/// Cloning is cheap: the pool is reference-counted and shared.
#[derive(Debug, Clone)]
pub struct PostgresProjectStorage {
    pool: PgPool,
}

impl PostgresProjectStorage {
    /// Creates a new `PostgresProjectStorage`, opening a connection pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the database cannot be reached.
    pub async fn new(config: &PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(config).await?;
        Ok(Self { pool })
    }

    /// Creates a new `PostgresProjectStorage` from an existing connection pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProjectStorage for PostgresProjectStorage {
    async fn get_by_id(&self, id: i32) -> Result<Option<Project>, StorageError> {
        queries::get_by_id(&self.pool, id).await
    }

    async fn get_all(&self) -> Result<Vec<Project>, StorageError> {
        queries::get_all(&self.pool).await
    }

    async fn get_by_filter(&self, filter: &ProjectFilter) -> Result<Vec<Project>, StorageError> {
        queries::get_by_filter(&self.pool, filter).await
    }

    async fn insert(&self, input: &ProjectInput) -> Result<Project, StorageError> {
        input.validate()?;
        queries::insert(&self.pool, input).await
    }

    async fn overwrite(&self, id: i32, input: &ProjectInput) -> Result<Project, StorageError> {
        input.validate()?;
        queries::overwrite(&self.pool, id, input).await
    }

    async fn remove(&self, id: i32) -> Result<(), StorageError> {
        queries::remove(&self.pool, id).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
