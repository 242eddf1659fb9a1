/// Stored media serving endpoint
use crate::{
    context::AppContext,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

/// Build media routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/media/:name", get(get_media))
}

/// Serve a stored media file by storage name
///
/// Names are content hashes, so responses are immutable and cacheable
/// forever.
async fn get_media(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let (data, mime_type) = ctx
        .media_store
        .get(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Media not found: {}", name)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::ETAG, format!("\"{}\"", name))
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(axum::body::Body::from(data))
        .map_err(|e| ApiError::Internal(format!("Failed to build media response: {}", e)))
}
