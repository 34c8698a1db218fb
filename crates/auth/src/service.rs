//! Login / refresh / logout protocol over a [`SessionStore`].
//!
//! Single-active-refresh-token policy: login overwrites the stored token,
//! refresh only reads it, logout clears it. Two concurrent logins for the same
//! user race on that field and the last write wins, which silently retires the
//! other session's refresh token. No generation counter guards the field, and
//! a write that lands before a client disconnects is not rolled back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use fieldops_core::normalize_email;

use crate::authorize::{
    PermissionChecker, PermissionExplanation, RequiredPermission, RolePermissions, RuleSource,
    explain_permission,
};
use crate::crypto::constant_time_str_eq;
use crate::error::AuthError;
use crate::password::{dummy_verify, verify_password};
use crate::principal::Principal;
use crate::roles::Role;
use crate::store::SessionStore;
use crate::token::TokenService;
use crate::user::{UserProfile, UserWithRole};

pub const BEARER: &str = "Bearer";

/// Response to a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Response to a successful refresh. `refresh_token` is the presented one,
/// unchanged: refresh does not rotate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// The caller's own profile plus the rules their role currently grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub permissions: Vec<String>,
    pub permission_source: RuleSource,
}

/// Session lifecycle and authorization entry point.
pub struct AuthService<S> {
    store: S,
    tokens: Arc<TokenService>,
}

impl<S> AuthService<S>
where
    S: SessionStore,
{
    pub fn new(store: S, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Verify credentials and open a session.
    ///
    /// The active flag is checked before the password outcome is surfaced, so
    /// a disabled account always answers `AccountDisabled`, even for a blank
    /// password.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(email)?;

        let Some(UserWithRole { user, role }) = self.store.find_user_by_email(&email).await? else {
            if password.is_empty() {
                return Err(password_required());
            }
            dummy_verify(password);
            debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let verified = !password.is_empty() && verify_password(password, &user.password_hash).is_ok();

        if !user.active {
            info!(user_id = %user.id, organization_id = %user.organization_id, "login rejected: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        if password.is_empty() {
            return Err(password_required());
        }

        if !verified {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let role = require_role(role.as_ref(), &user.organization_id)?;

        let pair = self
            .tokens
            .generate_token_pair(user.id, user.organization_id, &user.email, &role.name)
            .inspect_err(|e| tracing::error!(user_id = %user.id, error = %e, "token signing failed"))?;

        self.store.update_refresh_token(user.id, &pair.refresh_token).await?;
        let now = self.tokens.now();
        self.store.update_last_login(user.id, now).await?;

        info!(user_id = %user.id, organization_id = %user.organization_id, "login succeeded");

        let mut profile = UserProfile::from_parts(&user, Some(role));
        profile.last_login_at = Some(now);

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: BEARER,
            expires_in: self.tokens.access_expires_in(),
            user: profile,
        })
    }

    /// Exchange the currently stored refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::Validation("refresh_token is required".to_string()));
        }

        let claims = self.tokens.validate_refresh_token(refresh_token)?;

        let Some(UserWithRole { user, role }) = self.store.find_user_with_role(claims.user_id).await? else {
            debug!(user_id = %claims.user_id, "refresh rejected: user not found");
            return Err(AuthError::InvalidRefreshToken);
        };

        if !user.active {
            info!(user_id = %user.id, "refresh rejected: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        if user.organization_id != claims.organization_id {
            warn!(
                user_id = %user.id,
                claim_organization_id = %claims.organization_id,
                "refresh rejected: organization mismatch"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        // A cryptographically valid token from an earlier login, or one issued
        // before logout, fails here.
        if !user.has_session() || !constant_time_str_eq(&user.refresh_token, refresh_token) {
            debug!(user_id = %user.id, "refresh rejected: token is not the stored one");
            return Err(AuthError::InvalidRefreshToken);
        }

        let role = require_role(role.as_ref(), &user.organization_id)?;

        let access_token = self
            .tokens
            .generate_access_token(user.id, user.organization_id, &user.email, &role.name)
            .inspect_err(|e| tracing::error!(user_id = %user.id, error = %e, "token signing failed"))?;

        debug!(user_id = %user.id, "access token refreshed");

        Ok(RefreshResponse {
            access_token,
            refresh_token: refresh_token.to_string(),
            token_type: BEARER,
            expires_in: self.tokens.access_expires_in(),
        })
    }

    /// Clear the stored refresh token. Unconditional for an authenticated caller.
    pub async fn logout(&self, principal: &Principal) -> Result<(), AuthError> {
        self.store
            .clear_refresh_token(principal.user_id)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %principal.user_id, error = %e, "failed to clear refresh token");
                AuthError::Logout(e)
            })?;
        info!(user_id = %principal.user_id, organization_id = %principal.organization_id, "logged out");
        Ok(())
    }

    pub async fn me(&self, principal: &Principal) -> Result<MeResponse, AuthError> {
        let record = self.load_member(principal).await?;
        let role = require_role(record.role.as_ref(), &principal.organization_id)?;
        let perms = RolePermissions::from_role(role);

        Ok(MeResponse {
            user: UserProfile::from_parts(&record.user, Some(role)),
            permissions: perms.rules().iter().map(|r| r.to_string()).collect(),
            permission_source: perms.source(),
        })
    }

    /// Check `required` for the caller against their current role.
    pub async fn authorize(
        &self,
        principal: &Principal,
        required: &RequiredPermission,
        checker: &dyn PermissionChecker,
    ) -> Result<(), AuthError> {
        let record = self.load_member(principal).await?;
        let role = require_role(record.role.as_ref(), &principal.organization_id)?;

        if checker.satisfies(role, principal.user_id, principal.organization_id, required) {
            Ok(())
        } else {
            debug!(
                user_id = %principal.user_id,
                organization_id = %principal.organization_id,
                required = %required,
                "permission denied"
            );
            Err(AuthError::PermissionDenied(required.to_string()))
        }
    }

    /// Show which of the caller's rules decides `requested`, without enforcing it.
    pub async fn explain(
        &self,
        principal: &Principal,
        requested: &str,
    ) -> Result<PermissionExplanation, AuthError> {
        let record = self.load_member(principal).await?;
        let role = require_role(record.role.as_ref(), &principal.organization_id)?;
        Ok(explain_permission(role, requested))
    }

    /// Load the caller's user row, requiring it to still exist, be active and
    /// belong to the caller's organization.
    async fn load_member(&self, principal: &Principal) -> Result<UserWithRole, AuthError> {
        let record = self
            .store
            .find_user_with_role(principal.user_id)
            .await?
            .ok_or(AuthError::AuthenticationRequired)?;

        if record.user.organization_id != principal.organization_id {
            warn!(
                user_id = %principal.user_id,
                claim_organization_id = %principal.organization_id,
                "token organization does not match user organization"
            );
            return Err(AuthError::AuthenticationRequired);
        }
        if !record.user.active {
            return Err(AuthError::AccountDisabled);
        }
        Ok(record)
    }
}

fn require_role<'a>(
    role: Option<&'a Role>,
    organization_id: &fieldops_core::OrganizationId,
) -> Result<&'a Role, AuthError> {
    let role = role.ok_or_else(|| AuthError::RoleConfiguration("user has no role".to_string()))?;
    if role.organization_id != *organization_id {
        return Err(AuthError::RoleConfiguration(format!(
            "role {} belongs to another organization",
            role.id
        )));
    }
    if !role.active {
        return Err(AuthError::RoleConfiguration(format!("role {} is inactive", role.id)));
    }
    Ok(role)
}

fn password_required() -> AuthError {
    AuthError::Validation("password is required".to_string())
}
