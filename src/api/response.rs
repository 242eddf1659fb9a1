/// Success response envelope
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// JSON envelope wrapping every successful response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 envelope
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    /// 201 envelope
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    pub fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_envelope_shape() {
        let envelope = ApiResponse::ok(serde_json::json!({"id": 1}), "done");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "done");
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn test_created_sets_201() {
        let envelope = ApiResponse::created((), "made");
        assert_eq!(envelope.status_code, 201);
        let response = envelope.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
