//! `fieldops-auth`: authentication and role-based authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: persistence is
//! reached through the [`SessionStore`] and [`OrganizationResolver`] traits.

pub mod authorize;
pub mod claims;
pub mod crypto;
pub mod error;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod service;
pub mod store;
pub mod token;
pub mod user;

pub use authorize::{
    PermissionChecker, PermissionExplanation, RequiredPermission, RoleBasedChecker,
    RolePermissions, RuleSource, explain_permission,
};
pub use claims::{Claims, TokenKind};
pub use error::{AuthError, ErrorClass};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{Permission, PermissionRule};
pub use principal::Principal;
pub use roles::{Role, RoleType};
pub use service::{AuthService, BEARER, LoginResponse, MeResponse, RefreshResponse};
pub use store::{OrganizationResolver, SessionStore, StoreError};
pub use token::{
    ACCESS_TOKEN_TTL_SECS, Clock, FixedClock, REFRESH_TOKEN_TTL_DAYS, SigningError, SystemClock,
    TokenConfig, TokenConfigError, TokenError, TokenService,
};
pub use user::{User, UserProfile, UserWithRole};
