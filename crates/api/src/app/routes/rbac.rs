//! Authorization debugging: why is a permission granted or denied.

use axum::{
    extract::{rejection::QueryRejection, Extension, Query, State},
    Json,
};

use fieldops_auth::PermissionExplanation;

use crate::app::dto::ExplainQuery;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::AuthContext;

/// GET /roles/explain?permission=X
pub async fn explain(
    State(services): State<AppServices>,
    Extension(ctx): Extension<AuthContext>,
    query: Result<Query<ExplainQuery>, QueryRejection>,
) -> Result<Json<PermissionExplanation>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let permission = query.permission.trim();
    if permission.is_empty() {
        return Err(ApiError::validation("permission is required"));
    }
    Ok(Json(services.auth.explain(&ctx.principal(), permission).await?))
}
