//! Boundary traits to persisted state owned outside the auth core.

use chrono::{DateTime, Utc};
use thiserror::Error;

use fieldops_core::{OrganizationId, UserId};

use crate::user::UserWithRole;

/// Store failure. Never retried here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out")]
    Timeout,

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("unique constraint violated: {0}")]
    Conflict(String),
}

/// Access to the user/role rows the session lifecycle reads and mutates.
///
/// Every write is a single-row atomic update. There is no generation counter
/// on the refresh-token field: concurrent writers race and the last write wins.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up by normalized email, role preloaded.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, StoreError>;

    /// Look up by id, role preloaded.
    async fn find_user_with_role(&self, user_id: UserId) -> Result<Option<UserWithRole>, StoreError>;

    /// Overwrite the stored refresh token.
    async fn update_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), StoreError>;

    /// Set the stored refresh token to the empty string.
    async fn clear_refresh_token(&self, user_id: UserId) -> Result<(), StoreError>;

    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> SessionStore for std::sync::Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, StoreError> {
        (**self).find_user_by_email(email).await
    }

    async fn find_user_with_role(&self, user_id: UserId) -> Result<Option<UserWithRole>, StoreError> {
        (**self).find_user_with_role(user_id).await
    }

    async fn update_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), StoreError> {
        (**self).update_refresh_token(user_id, token).await
    }

    async fn clear_refresh_token(&self, user_id: UserId) -> Result<(), StoreError> {
        (**self).clear_refresh_token(user_id).await
    }

    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).update_last_login(user_id, at).await
    }
}

/// Maps a host subdomain to the organization it belongs to.
#[async_trait::async_trait]
pub trait OrganizationResolver: Send + Sync {
    async fn resolve_subdomain(&self, subdomain: &str) -> Result<Option<OrganizationId>, StoreError>;
}

#[async_trait::async_trait]
impl<R> OrganizationResolver for std::sync::Arc<R>
where
    R: OrganizationResolver + ?Sized,
{
    async fn resolve_subdomain(&self, subdomain: &str) -> Result<Option<OrganizationId>, StoreError> {
        (**self).resolve_subdomain(subdomain).await
    }
}
