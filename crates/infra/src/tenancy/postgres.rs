use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use fieldops_auth::{OrganizationResolver, StoreError};
use fieldops_core::OrganizationId;

use crate::db::map_sqlx_error;

/// Resolves subdomains against `organizations.subdomain`. Inactive
/// organizations do not resolve.
#[derive(Debug, Clone)]
pub struct PgOrganizationResolver {
    pool: Arc<PgPool>,
}

impl PgOrganizationResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait::async_trait]
impl OrganizationResolver for PgOrganizationResolver {
    #[instrument(skip(self), err)]
    async fn resolve_subdomain(&self, subdomain: &str) -> Result<Option<OrganizationId>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id
            FROM organizations
            WHERE LOWER(subdomain) = LOWER($1) AND active
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("resolve_subdomain", e))?;

        row.map(|r| r.try_get::<uuid::Uuid, _>("id"))
            .transpose()
            .map(|id| id.map(OrganizationId::from_uuid))
            .map_err(|e| map_sqlx_error("resolve_subdomain", e))
    }
}
