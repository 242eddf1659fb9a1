/// Unified error types for the Clipstream backend
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid, expired, or mismatched credential or token
    #[error("{0}")]
    Authentication(String),

    /// No such account or channel
    #[error("{0}")]
    NotFound(String),

    /// Duplicate username or email
    #[error("{0}")]
    Conflict(String),

    /// Media staging or storage errors
    #[error("Media storage error: {0}")]
    MediaStorage(String),

    /// Token signing errors
    #[error("Token error: {0}")]
    Jwt(String),

    /// Rate limiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failures
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error envelope returned to clients
///
/// Mirrors the success envelope in `api::response` with `data` pinned to null
/// and `success` pinned to false.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub data: Option<()>,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Authentication(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            // Don't leak internals to the client
            ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Internal(_)
            | ApiError::MediaStorage(_)
            | ApiError::Jwt(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(ErrorEnvelope {
            status_code: status.as_u16(),
            data: None,
            message,
            success: false,
            errors: Vec::new(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Validation("missing field".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Authentication("bad token".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::NotFound("no user".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("taken".into()), StatusCode::CONFLICT),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = ApiError::Internal("secret connection string".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The envelope message is generic; the detail only goes to the log
    }
}
