use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use fieldops_auth::{LoginResponse, MeResponse, RefreshResponse};

use crate::app::dto::{LoginRequest, MessageResponse, RefreshRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::AuthContext;

/// POST /auth/login
pub async fn login(
    State(services): State<AppServices>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(Json(services.auth.login(&req.email, &req.password).await?))
}

/// POST /auth/refresh
pub async fn refresh(
    State(services): State<AppServices>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(Json(services.auth.refresh(&req.refresh_token).await?))
}

/// POST /auth/logout
pub async fn logout(
    State(services): State<AppServices>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.auth.logout(&ctx.principal()).await?;
    Ok(Json(MessageResponse { message: "logged out" }))
}

/// GET /auth/me
pub async fn me(
    State(services): State<AppServices>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<MeResponse>, ApiError> {
    Ok(Json(services.auth.me(&ctx.principal()).await?))
}
