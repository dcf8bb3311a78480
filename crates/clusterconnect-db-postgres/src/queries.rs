//! SQL for the `projects` table.
//!
//! Expected layout (created by the operator, not by this crate):
//!
//! ```sql
//! CREATE TABLE projects (
//!     id          SERIAL PRIMARY KEY,
//!     title       VARCHAR(200)  NOT NULL,
//!     description VARCHAR(2000),
//!     status      VARCHAR(50)   NOT NULL DEFAULT 'PLANNING',
//!     created_at  TIMESTAMPTZ   NOT NULL DEFAULT CURRENT_TIMESTAMP,
//!     updated_at  TIMESTAMPTZ,
//!     tech_stack  VARCHAR(500),
//!     team_size   INTEGER,
//!     category    VARCHAR(100),
//!     is_public   BOOLEAN       NOT NULL DEFAULT TRUE
//! );
//! CREATE INDEX ON projects (status);
//! CREATE INDEX ON projects (category);
//! ```

use chrono::{DateTime, Utc};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_builder::QueryBuilder;
use sqlx_postgres::{PgPool, Postgres};
use time::OffsetDateTime;

use clusterconnect_storage::{Project, ProjectFilter, ProjectInput, StorageError};

use crate::error::map_sqlx_error;

const COLUMNS: &str = "id, title, description, status, created_at, updated_at, \
                       tech_stack, team_size, category, is_public";

const ORDER_NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

type ProjectRow = (
    i32,
    String,
    Option<String>,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<i32>,
    Option<String>,
    bool,
);

/// Converts chrono DateTime to time OffsetDateTime.
///
/// Fails for instants outside the range `time` can represent.
fn chrono_to_time(dt: DateTime<Utc>) -> Result<OffsetDateTime, StorageError> {
    let nanos = i128::from(dt.timestamp()) * 1_000_000_000
        + i128::from(dt.timestamp_subsec_nanos());
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|e| StorageError::internal(format!("timestamp {dt} out of range: {e}")))
}

fn row_to_project(row: ProjectRow) -> Result<Project, StorageError> {
    let (
        id,
        title,
        description,
        status,
        created_at,
        updated_at,
        tech_stack,
        team_size,
        category,
        is_public,
    ) = row;
    Ok(Project {
        id,
        title,
        description,
        status,
        created_at: chrono_to_time(created_at)?,
        updated_at: updated_at.map(chrono_to_time).transpose()?,
        tech_stack,
        team_size,
        category,
        is_public,
    })
}

pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Project>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
    let row: Option<ProjectRow> = query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_sqlx_error(e, "failed to read project"))?;
    row.map(row_to_project).transpose()
}

pub async fn get_all(pool: &PgPool) -> Result<Vec<Project>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM projects{ORDER_NEWEST_FIRST}");
    let rows: Vec<ProjectRow> = query_as(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error(e, "failed to list projects"))?;
    rows.into_iter().map(row_to_project).collect()
}

pub async fn get_by_filter(
    pool: &PgPool,
    filter: &ProjectFilter,
) -> Result<Vec<Project>, StorageError> {
    let mut builder = filter_query(filter);
    let rows: Vec<ProjectRow> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error(e, "failed to filter projects"))?;
    rows.into_iter().map(row_to_project).collect()
}

/// Builds the filtered listing query. String criteria compare case-insensitively.
fn filter_query(filter: &ProjectFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM projects WHERE TRUE"));
    if let Some(ref status) = filter.status {
        builder.push(" AND LOWER(status) = LOWER(");
        builder.push_bind(status.as_str());
        builder.push(")");
    }
    if let Some(ref category) = filter.category {
        builder.push(" AND LOWER(category) = LOWER(");
        builder.push_bind(category.as_str());
        builder.push(")");
    }
    if let Some(is_public) = filter.is_public {
        builder.push(" AND is_public = ");
        builder.push_bind(is_public);
    }
    builder.push(ORDER_NEWEST_FIRST);
    builder
}

pub async fn insert(pool: &PgPool, input: &ProjectInput) -> Result<Project, StorageError> {
    let sql = format!(
        "INSERT INTO projects \
           (title, description, status, created_at, tech_stack, team_size, category, is_public) \
         VALUES ($1, $2, $3, NOW(), $4, $5, $6, $7) \
         RETURNING {COLUMNS}"
    );
    let row: ProjectRow = query_as(&sql)
        .bind(input.title.as_str())
        .bind(input.description.as_deref())
        .bind(input.status.as_str())
        .bind(input.tech_stack.as_deref())
        .bind(input.team_size)
        .bind(input.category.as_deref())
        .bind(input.is_public)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error(e, "failed to insert project"))?;
    row_to_project(row)
}

pub async fn overwrite(
    pool: &PgPool,
    id: i32,
    input: &ProjectInput,
) -> Result<Project, StorageError> {
    let sql = format!(
        "UPDATE projects SET \
           title = $2, description = $3, status = $4, tech_stack = $5, \
           team_size = $6, category = $7, is_public = $8, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    );
    let row: Option<ProjectRow> = query_as(&sql)
        .bind(id)
        .bind(input.title.as_str())
        .bind(input.description.as_deref())
        .bind(input.status.as_str())
        .bind(input.tech_stack.as_deref())
        .bind(input.team_size)
        .bind(input.category.as_deref())
        .bind(input.is_public)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_sqlx_error(e, "failed to update project"))?;
    row.map(row_to_project)
        .unwrap_or_else(|| Err(StorageError::not_found(id)))
}

pub async fn remove(pool: &PgPool, id: i32) -> Result<(), StorageError> {
    let result = query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error(e, "failed to delete project"))?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found(id));
    }
    Ok(())
}
