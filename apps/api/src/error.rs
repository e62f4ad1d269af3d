use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use staffguard_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = match self.0 {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", self.0.to_string()),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", self.0.to_string()),
            ),
            AppError::Conflict(_) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("CONFLICT", self.0.to_string()),
            ),
            AppError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("UNAUTHORIZED", self.0.to_string()),
            ),
            AppError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("FORBIDDEN", self.0.to_string()),
            ),
            AppError::PermissionDenied { ref permission } => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("FORBIDDEN", self.0.to_string())
                    .with_required_permission(permission.clone()),
            ),
            AppError::InsufficientPriority { .. } => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("INSUFFICIENT_PRIORITY", self.0.to_string()),
            ),
            AppError::PolicyDenied { code, ref message } => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new(code.as_str(), message.clone()),
            ),
            AppError::Internal(ref message) => {
                tracing::error!(error = %message, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "internal server error".to_owned()),
                )
            }
        };

        (status, Json(payload)).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
