use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

use fieldops_auth::permissions::catalog;
use fieldops_auth::RequiredPermission;

use crate::app::services::AppServices;
use crate::middleware::{self, PermissionGuard, TenantGuard};

pub mod auth;
pub mod rbac;
pub mod system;

/// Routes that need no credentials.
pub fn public() -> Router<AppServices> {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
}

/// Routes behind a valid access token.
pub fn authenticated(services: &AppServices) -> Router<AppServices> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            services.clone(),
            middleware::require_auth,
        ))
}

/// Routes behind a valid access token plus `roles.read`.
pub fn rbac(services: &AppServices) -> Router<AppServices> {
    let guard = PermissionGuard::new(services.clone(), RequiredPermission::one(catalog::ROLES_READ));
    Router::new()
        .route("/roles/explain", get(rbac::explain))
        .route_layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    services.clone(),
                    middleware::require_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(guard, middleware::require_permission)),
        )
}

/// Public routes that still need an organization.
pub fn tenant_scoped(services: &AppServices) -> Router<AppServices> {
    Router::new()
        .route("/tenant", get(system::tenant))
        .route_layer(axum::middleware::from_fn_with_state(
            TenantGuard::new(services.clone()).allow_query_param(),
            middleware::resolve_tenant,
        ))
}
