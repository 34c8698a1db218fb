use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use fieldops_auth::{hash_password, AuthError, Role, SessionStore, StoreError, User, UserWithRole};
use fieldops_core::{normalize_email, OrganizationId, RoleId, UserId};

#[derive(Debug, Default)]
struct Rows {
    users: HashMap<UserId, User>,
    roles: HashMap<RoleId, Role>,
}

/// In-memory user/role store for tests and local dev.
///
/// Each trait operation takes the lock once, so every write is atomic per row.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<Rows>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a role row.
    pub fn insert_role(&self, role: Role) -> Result<(), StoreError> {
        self.write()?.roles.insert(role.id, role);
        Ok(())
    }

    /// Create an active user the way account creation does: normalized email,
    /// Argon2id hash, no session. Emails are unique case-insensitively, as in
    /// the `users_email_lower_idx` index.
    pub fn register_user(
        &self,
        organization_id: OrganizationId,
        email: &str,
        password: &str,
        role_id: RoleId,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let password_hash = hash_password(password)?;

        let mut rows = self.write()?;
        if rows.users.values().any(|u| u.email.eq_ignore_ascii_case(&email)) {
            return Err(StoreError::Conflict(format!("email {email} is already registered")).into());
        }

        let user = User {
            id: UserId::new(),
            organization_id,
            email,
            password_hash,
            role_id,
            refresh_token: String::new(),
            active: true,
            last_login_at: None,
        };
        rows.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn set_user_active(&self, user_id: UserId, active: bool) -> Result<(), StoreError> {
        if let Some(user) = self.write()?.users.get_mut(&user_id) {
            user.active = active;
        }
        Ok(())
    }

    /// Snapshot of a user row.
    pub fn user(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("session store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("session store lock poisoned".to_string()))
    }

    fn with_role(rows: &Rows, user: &User) -> UserWithRole {
        UserWithRole {
            user: user.clone(),
            role: rows.roles.get(&user.role_id).cloned(),
        }
    }

    fn update_user(&self, user_id: UserId, f: impl FnOnce(&mut User)) -> Result<(), StoreError> {
        // Updating a missing row is a no-op, like an UPDATE matching zero rows.
        if let Some(user) = self.write()?.users.get_mut(&user_id) {
            f(user);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserWithRole>, StoreError> {
        let needle = email.trim().to_lowercase();
        let rows = self.read()?;
        Ok(rows
            .users
            .values()
            .find(|u| u.email.to_lowercase() == needle)
            .map(|u| Self::with_role(&rows, u)))
    }

    async fn find_user_with_role(&self, user_id: UserId) -> Result<Option<UserWithRole>, StoreError> {
        let rows = self.read()?;
        Ok(rows.users.get(&user_id).map(|u| Self::with_role(&rows, u)))
    }

    async fn update_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), StoreError> {
        self.update_user(user_id, |u| u.refresh_token = token.to_string())
    }

    async fn clear_refresh_token(&self, user_id: UserId) -> Result<(), StoreError> {
        self.update_user(user_id, |u| u.refresh_token.clear())
    }

    async fn update_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_user(user_id, |u| u.last_login_at = Some(at))
    }
}
