//! Postgres-backed session store over the `users` and `roles` tables.
//!
//! Every mutation is a single-row `UPDATE ... WHERE id = $1`; Postgres makes
//! each one atomic on its own. No statement reads the refresh token before
//! writing it, so concurrent logins resolve as last write wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use fieldops_auth::{Role, RoleType, SessionStore, StoreError, User, UserWithRole};
use fieldops_core::{OrganizationId, RoleId, UserId};

use crate::db::map_sqlx_error;

const SELECT_USER_WITH_ROLE: &str = r#"
    SELECT
        u.id,
        u.organization_id,
        u.email,
        u.password_hash,
        u.role_id,
        u.refresh_token,
        u.active,
        u.last_login_at,
        r.id              AS r_id,
        r.organization_id AS r_organization_id,
        r.name            AS r_name,
        r.role_type       AS r_role_type,
        r.permissions     AS r_permissions,
        r.active          AS r_active
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
"#;

#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: Arc<PgPool>,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(skip_all, err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, StoreError> {
        let sql = format!("{SELECT_USER_WITH_ROLE} WHERE LOWER(u.email) = LOWER($1) LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(email.trim())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_with_role_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn find_user_with_role(&self, user_id: UserId) -> Result<Option<UserWithRole>, StoreError> {
        let sql = format!("{SELECT_USER_WITH_ROLE} WHERE u.id = $1");
        let row = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_with_role", e))?;
        row.as_ref().map(user_with_role_from_row).transpose()
    }

    #[instrument(skip(self, token), fields(user_id = %user_id), err)]
    async fn update_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(token)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_refresh_token", e))?;
        log_unmatched("update_refresh_token", result.rows_affected());
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn clear_refresh_token(&self, user_id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET refresh_token = '' WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_refresh_token", e))?;
        log_unmatched("clear_refresh_token", result.rows_affected());
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_last_login", e))?;
        log_unmatched("update_last_login", result.rows_affected());
        Ok(())
    }
}

fn log_unmatched(operation: &str, rows_affected: u64) {
    if rows_affected == 0 {
        tracing::debug!(operation, "update matched no user row");
    }
}

fn user_with_role_from_row(row: &sqlx::postgres::PgRow) -> Result<UserWithRole, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode user row", e);

    let user = User {
        id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
        organization_id: OrganizationId::from_uuid(row.try_get("organization_id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role_id: RoleId::from_uuid(row.try_get("role_id").map_err(decode)?),
        refresh_token: row
            .try_get::<Option<String>, _>("refresh_token")
            .map_err(decode)?
            .unwrap_or_default(),
        active: row.try_get("active").map_err(decode)?,
        last_login_at: row.try_get("last_login_at").map_err(decode)?,
    };

    // LEFT JOIN: every role column is NULL when the role row is gone.
    let role = match row.try_get::<Option<uuid::Uuid>, _>("r_id").map_err(decode)? {
        None => None,
        Some(id) => {
            let raw_type: String = row.try_get("r_role_type").map_err(decode)?;
            let role_type: RoleType = raw_type
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("role {id}: {e}")))?;
            Some(Role {
                id: RoleId::from_uuid(id),
                organization_id: OrganizationId::from_uuid(
                    row.try_get("r_organization_id").map_err(decode)?,
                ),
                name: row.try_get("r_name").map_err(decode)?,
                role_type,
                permissions: row.try_get("r_permissions").map_err(decode)?,
                active: row.try_get("r_active").map_err(decode)?,
            })
        }
    };

    Ok(UserWithRole { user, role })
}
