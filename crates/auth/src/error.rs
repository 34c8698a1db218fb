//! Auth error taxonomy with stable, caller-visible codes.

use thiserror::Error;

use fieldops_core::DomainError;

use crate::password::PasswordError;
use crate::store::StoreError;
use crate::token::{SigningError, TokenError};

/// Every way the auth core can reject a request.
///
/// Each variant is terminal for the current request; nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing Authorization header")]
    MissingAuthHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    InvalidAuthHeader,

    #[error("{0}")]
    Token(#[from] TokenError),

    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("refresh token is no longer valid")]
    InvalidRefreshToken,

    #[error("insufficient permissions: requires {0}")]
    PermissionDenied(String),

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("organization context is required")]
    OrganizationRequired,

    #[error("no organization for subdomain '{0}'")]
    TenantNotFound(String),

    /// Role missing, inactive, or from another organization. A server-side
    /// misconfiguration, not a client error.
    #[error("role configuration error: {0}")]
    RoleConfiguration(String),

    #[error("{0}")]
    TokenGeneration(#[from] SigningError),

    #[error("logout failed: {0}")]
    Logout(StoreError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for status mapping and log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Unauthenticated,
    Forbidden,
    Internal,
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::MissingAuthHeader => "MISSING_AUTH_HEADER",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::Token(TokenError::WrongType { .. }) => "INVALID_TOKEN_TYPE",
            AuthError::Token(_) => "INVALID_TOKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountDisabled => "ACCOUNT_DISABLED",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::PermissionDenied(_) => "INSUFFICIENT_PERMISSIONS",
            AuthError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AuthError::OrganizationRequired => "ORGANIZATION_REQUIRED",
            AuthError::TenantNotFound(_) => "TENANT_NOT_FOUND",
            AuthError::RoleConfiguration(_) => "ROLE_CONFIGURATION_ERROR",
            AuthError::TokenGeneration(_) => "TOKEN_GENERATION_ERROR",
            AuthError::Logout(_) => "LOGOUT_ERROR",
            AuthError::Store(_) | AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::Validation(_)
            | AuthError::OrganizationRequired
            | AuthError::TenantNotFound(_) => ErrorClass::BadRequest,
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::Token(_)
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled
            | AuthError::InvalidRefreshToken
            | AuthError::AuthenticationRequired => ErrorClass::Unauthenticated,
            AuthError::PermissionDenied(_) => ErrorClass::Forbidden,
            AuthError::RoleConfiguration(_)
            | AuthError::TokenGeneration(_)
            | AuthError::Logout(_)
            | AuthError::Store(_)
            | AuthError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// HTTP status the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::BadRequest => 400,
            ErrorClass::Unauthenticated => 401,
            ErrorClass::Forbidden => 403,
            ErrorClass::Internal => 500,
        }
    }

    /// Message safe to show to callers. Internal failures get a fixed text;
    /// their detail only goes to logs.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::RoleConfiguration(_) => "role configuration error".to_string(),
            AuthError::TokenGeneration(_) => "failed to generate token".to_string(),
            AuthError::Logout(_) => "failed to log out".to_string(),
            AuthError::Store(_) | AuthError::Internal(_) => "internal server error".to_string(),
            // Token failures collapse into one message per code.
            AuthError::Token(TokenError::WrongType { .. }) => "invalid token type".to_string(),
            AuthError::Token(_) => "invalid or expired token".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(value: DomainError) -> Self {
        AuthError::Validation(value.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(value: PasswordError) -> Self {
        match value {
            PasswordError::Mismatch => AuthError::InvalidCredentials,
            PasswordError::Hashing(msg) => AuthError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::TokenKind;

    #[test]
    fn codes_and_statuses() {
        let cases: Vec<(AuthError, &str, u16)> = vec![
            (AuthError::MissingAuthHeader, "MISSING_AUTH_HEADER", 401),
            (AuthError::InvalidAuthHeader, "INVALID_AUTH_HEADER", 401),
            (AuthError::Token(TokenError::Expired), "INVALID_TOKEN", 401),
            (AuthError::Token(TokenError::Malformed), "INVALID_TOKEN", 401),
            (AuthError::Token(TokenError::SignatureInvalid), "INVALID_TOKEN", 401),
            (
                AuthError::Token(TokenError::WrongType {
                    expected: TokenKind::Access,
                    found: TokenKind::Refresh,
                }),
                "INVALID_TOKEN_TYPE",
                401,
            ),
            (AuthError::InvalidCredentials, "INVALID_CREDENTIALS", 401),
            (AuthError::AccountDisabled, "ACCOUNT_DISABLED", 401),
            (AuthError::InvalidRefreshToken, "INVALID_REFRESH_TOKEN", 401),
            (AuthError::PermissionDenied("x.y".into()), "INSUFFICIENT_PERMISSIONS", 403),
            (AuthError::AuthenticationRequired, "AUTHENTICATION_REQUIRED", 401),
            (AuthError::OrganizationRequired, "ORGANIZATION_REQUIRED", 400),
            (AuthError::TenantNotFound("acme".into()), "TENANT_NOT_FOUND", 400),
            (AuthError::TokenGeneration(SigningError("k".into())), "TOKEN_GENERATION_ERROR", 500),
            (AuthError::Logout(StoreError::Timeout), "LOGOUT_ERROR", 500),
            (AuthError::RoleConfiguration("gone".into()), "ROLE_CONFIGURATION_ERROR", 500),
            (AuthError::Store(StoreError::Timeout), "INTERNAL_ERROR", 500),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code(), code, "{err:?}");
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn internal_detail_is_not_public() {
        let err = AuthError::Store(StoreError::Unavailable("pg at 10.0.0.3 refused".into()));
        assert!(!err.public_message().contains("10.0.0.3"));

        let err = AuthError::TokenGeneration(SigningError("bad key".into()));
        assert!(!err.public_message().contains("bad key"));
    }

    #[test]
    fn password_mismatch_maps_to_invalid_credentials() {
        assert_eq!(AuthError::from(PasswordError::Mismatch), AuthError::InvalidCredentials);
    }
}
