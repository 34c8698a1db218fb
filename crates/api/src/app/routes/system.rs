use axum::{extract::Extension, http::StatusCode, Json};

use crate::app::dto::TenantResponse;
use crate::context::OrganizationContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /tenant: the organization resolved for this request.
pub async fn tenant(Extension(org): Extension<OrganizationContext>) -> Json<TenantResponse> {
    Json(TenantResponse {
        organization_id: org.organization_id(),
        source: org.source(),
    })
}
