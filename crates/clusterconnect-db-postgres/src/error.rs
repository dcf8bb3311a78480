//! Error types for the PostgreSQL storage backend.

use clusterconnect_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for a value too long for its column (22001).
pub const PG_STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// PostgreSQL error code for a NOT NULL violation (23502).
pub const PG_NOT_NULL_VIOLATION: &str = "23502";

/// PostgreSQL error code for a CHECK constraint violation (23514).
pub const PG_CHECK_VIOLATION: &str = "23514";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Database(e) => map_sqlx_error(e, "database error"),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Translates a sqlx error into the storage taxonomy.
///
/// Transport and pool failures become `Unavailable`; constraint violations
/// become `InvalidProject`; everything else is `Internal`.
pub fn map_sqlx_error(err: SqlxError, context: &str) -> StorageError {
    if [
        PG_STRING_DATA_RIGHT_TRUNCATION,
        PG_NOT_NULL_VIOLATION,
        PG_CHECK_VIOLATION,
    ]
    .iter()
    .any(|code| has_pg_error_code(&err, code))
    {
        return StorageError::invalid_project(format!("{context}: {err}"));
    }

    match err {
        SqlxError::Io(_)
        | SqlxError::Tls(_)
        | SqlxError::PoolTimedOut
        | SqlxError::PoolClosed
        | SqlxError::WorkerCrashed => StorageError::unavailable(format!("{context}: {err}")),
        other => StorageError::internal(format!("{context}: {other}")),
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
