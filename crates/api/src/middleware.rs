//! Authentication gate.
//!
//! Each request walks `header → token → signature → expiry → kind → tenant →
//! [permission]` and stops at the first failure. Contexts are inserted only
//! after every step has passed, so handlers never see a partial identity.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use fieldops_auth::{AuthError, RequiredPermission};
use fieldops_core::OrganizationId;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AuthContext, OrganizationContext, TenantSource};
use crate::tenant::subdomain_from_host;

/// Require a valid access token. The organization comes from its claims.
pub async fn require_auth(
    State(services): State<AppServices>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let claims = services
        .tokens()
        .validate_access_token(token)
        .map_err(AuthError::from)?;

    tracing::debug!(
        user_id = %claims.user_id,
        organization_id = %claims.organization_id,
        "request authenticated"
    );

    req.extensions_mut()
        .insert(OrganizationContext::new(claims.organization_id, TenantSource::Token));
    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// State for [`resolve_tenant`].
#[derive(Clone)]
pub struct TenantGuard {
    services: AppServices,
    allow_query_param: bool,
}

impl TenantGuard {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            allow_query_param: false,
        }
    }

    /// Let the route fall back to an `organization_id` query parameter.
    pub fn allow_query_param(mut self) -> Self {
        self.allow_query_param = true;
        self
    }
}

/// Resolve the organization for a route that does not require a login.
///
/// First match wins: a bearer access token that validates, then the host
/// subdomain, then the `organization_id` query parameter where the route
/// allows it. An unusable Authorization header only counts as no match here;
/// [`require_auth`] is what rejects it.
pub async fn resolve_tenant(
    State(guard): State<TenantGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let inputs = TenantInputs::from_request(&req, guard.allow_query_param);
    let organization = resolve_organization(&guard.services, inputs).await?;
    req.extensions_mut().insert(organization);
    Ok(next.run(req).await)
}

/// State for [`require_permission`].
#[derive(Clone)]
pub struct PermissionGuard {
    services: AppServices,
    required: Arc<RequiredPermission>,
}

impl PermissionGuard {
    pub fn new(services: AppServices, required: RequiredPermission) -> Self {
        Self {
            services,
            required: Arc::new(required),
        }
    }
}

/// Check a permission requirement against the caller's current role.
/// Layer after [`require_auth`].
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<AuthContext>()
        .map(AuthContext::principal)
        .ok_or(AuthError::AuthenticationRequired)?;

    guard
        .services
        .auth
        .authorize(&principal, &guard.required, guard.services.checker.as_ref())
        .await?;

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

#[derive(Debug, Deserialize)]
struct OrganizationQuery {
    organization_id: Option<String>,
}

/// Owned copies of the request parts tenant resolution reads, so the request
/// itself is not borrowed across the resolver call.
#[derive(Debug, Default)]
struct TenantInputs {
    bearer: Option<String>,
    subdomain: Option<String>,
    query_organization: Option<String>,
}

impl TenantInputs {
    fn from_request(req: &Request, allow_query_param: bool) -> Self {
        let headers = req.headers();
        let bearer = extract_bearer(headers).ok().map(str::to_string);

        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host());
        let subdomain = host.and_then(subdomain_from_host);

        let query_organization = if allow_query_param {
            query_organization(req.uri())
        } else {
            None
        };

        Self {
            bearer,
            subdomain,
            query_organization,
        }
    }
}

fn query_organization(uri: &Uri) -> Option<String> {
    Query::<OrganizationQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.organization_id)
        .filter(|s| !s.trim().is_empty())
}

async fn resolve_organization(
    services: &AppServices,
    inputs: TenantInputs,
) -> Result<OrganizationContext, AuthError> {
    if let Some(bearer) = inputs.bearer {
        match services.tokens().validate_access_token(&bearer) {
            Ok(claims) => {
                return Ok(OrganizationContext::new(claims.organization_id, TenantSource::Token));
            }
            Err(error) => tracing::debug!(%error, "bearer token unusable for tenant resolution"),
        }
    }

    if let Some(subdomain) = inputs.subdomain {
        return match services.resolver.resolve_subdomain(&subdomain).await? {
            Some(organization_id) => Ok(OrganizationContext::new(organization_id, TenantSource::Subdomain)),
            None => {
                tracing::debug!(%subdomain, "unknown tenant subdomain");
                Err(AuthError::TenantNotFound(subdomain))
            }
        };
    }

    if let Some(raw) = inputs.query_organization {
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AuthError::Validation("organization_id must be a UUID".to_string()))?;
        return Ok(OrganizationContext::new(
            OrganizationId::from_uuid(id),
            TenantSource::QueryParam,
        ));
    }

    Err(AuthError::OrganizationRequired)
}
