//! Request-level error taxonomy.
//!
//! Every failure a handler can produce maps to exactly one status code and a
//! JSON body of the form `{"error": <code>, "message": <text>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed input, duplicate email.
    #[error("{0}")]
    Validation(String),

    /// Sign-in rejections. Kept at 400 so clients can show the exact message.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing or malformed bearer header, bad or expired token.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Signing secret or token lifetime absent.
    #[error("{0}")]
    Configuration(String),

    /// Outbound mail or other transport failure.
    #[error("{0}")]
    Dependency(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Dependency(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidCredentials(_) => "invalid_credentials",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Configuration(_) => "configuration_error",
            AppError::Dependency(_) => "dependency_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "unhandled error");
                "Internal server error".to_string()
            }
            AppError::Configuration(msg) => {
                error!(error = %msg, "server misconfigured");
                msg.clone()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(serde_json::json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
