use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use fieldops_auth::{AuthError, ErrorClass};

/// Transport wrapper for [`AuthError`]: maps each variant to its status and
/// the `{"error": {"code", "message"}}` body.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self(value)
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AuthError::Validation(msg.into()))
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        match self.0.class() {
            ErrorClass::Internal => tracing::error!(code, error = %self.0, "request failed"),
            _ => tracing::debug!(code, error = %self.0, "request rejected"),
        }
        json_error(self.status(), code, self.0.public_message())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": {
                "code": code,
                "message": message.into(),
            }
        })),
    )
        .into_response()
}
