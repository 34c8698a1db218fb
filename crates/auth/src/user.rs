//! User account as seen by the auth core.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fieldops_core::{OrganizationId, RoleId, UserId};

use crate::Role;

/// A persisted user account.
///
/// # Invariants
/// - A user belongs to exactly one organization.
/// - At most one refresh token is stored; an empty string means no session.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub organization_id: OrganizationId,
    /// Normalized (trimmed, lowercased) email.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: RoleId,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_session(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("organization_id", &self.organization_id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role_id", &self.role_id)
            .field("has_session", &self.has_session())
            .field("active", &self.active)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

/// A user with its role preloaded. `role` is `None` when the role row is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithRole {
    pub user: User,
    pub role: Option<Role>,
}

/// Public profile returned to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub role: String,
    pub role_type: Option<crate::RoleType>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn from_parts(user: &User, role: Option<&Role>) -> Self {
        Self {
            id: user.id,
            organization_id: user.organization_id,
            email: user.email.clone(),
            role: role.map(|r| r.name.clone()).unwrap_or_default(),
            role_type: role.map(|r| r.role_type),
            last_login_at: user.last_login_at,
        }
    }
}
