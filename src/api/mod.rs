/// API routes and handlers
pub mod media;
pub mod middleware;
pub mod response;
pub mod users;

use crate::{config::ServiceConfig, context::AppContext};
use axum::Router;

/// Build API routes
pub fn routes(service: &ServiceConfig) -> Router<AppContext> {
    Router::new()
        .merge(users::routes(service))
        .merge(media::routes())
}
