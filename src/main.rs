/// Clipstream - user account and channel backend
///
/// Registration, credential verification, session token issuance and
/// rotation, profile media upload, and channel profile aggregation for a
/// video sharing service.

mod account;
mod api;
mod auth;
mod channel;
mod config;
mod context;
mod db;
mod error;
mod media;
mod rate_limit;
mod server;
mod token;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipstream=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
