//! Postgres pool wiring and schema bootstrap.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|------------|----------|
//! | PoolTimedOut | `Timeout` | No connection available within the acquire timeout |
//! | ColumnDecode / Decode / ColumnNotFound | `Corrupt` | Row does not match the expected shape |
//! | Database (unique violation) | `Conflict` | Duplicate email or subdomain |
//! | Database (other) | `Unavailable` | Statement rejected by the server |
//! | PoolClosed / Io / other | `Unavailable` | Connection failures |
//!
//! Nothing is retried; callers surface every variant as an internal error.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use fieldops_auth::StoreError;

/// Schema for the `organizations`, `roles` and `users` tables.
pub const SCHEMA_SQL: &str = include_str!("../migrations/0001_auth_schema.sql");

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection pool. Acquisition is bounded so a saturated pool turns
/// into `StoreError::Timeout` instead of hanging a request.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Create the tables if they do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    tracing::info!("auth schema applied");
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("{operation}: {}", db_err.message()))
        }
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable(format!("connection pool closed in {operation}")),
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}
