/// Application context and dependency injection
use crate::{
    account::AccountStore,
    channel::ChannelQuery,
    config::ServerConfig,
    db,
    error::ApiResult,
    media::{MediaStore, MediaStoreConfig},
    rate_limit::RateLimiter,
    token::TokenService,
};
use std::sync::Arc;

/// Application context holding all shared services
///
/// Constructed once at startup and cloned into every handler; there is no
/// global state. Teardown is dropping the context, which closes the pool.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub account_store: Arc<AccountStore>,
    pub token_service: Arc<TokenService>,
    pub channels: Arc<ChannelQuery>,
    pub media_store: Arc<MediaStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.account_db, db::DatabaseOptions::default())
            .await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let account_store = Arc::new(AccountStore::new(pool.clone()));
        let token_service = Arc::new(TokenService::new(&config.authentication));
        let channels = Arc::new(ChannelQuery::new(pool.clone()));

        let media_store = Arc::new(MediaStore::new(MediaStoreConfig {
            media_directory: config.storage.media_directory.clone(),
            public_url: config.service.public_url.clone(),
        }));

        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Ok(Self {
            config: Arc::new(config),
            account_store,
            token_service,
            channels,
            media_store,
            rate_limiter,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> ApiResult<()> {
        let dirs = [
            &config.storage.data_directory,
            &config.storage.media_directory,
            &config.storage.staging_directory,
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
