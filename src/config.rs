/// Configuration management for the Clipstream backend
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL advertised in stored media references
    pub public_url: String,
    pub cors_origin: Option<String>,
    /// Limit on non-upload request bodies, in bytes
    pub body_limit: usize,
    /// Limit on multipart upload bodies, in bytes
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub account_db: PathBuf,
    /// Permanent home of uploaded media files
    pub media_directory: PathBuf,
    /// Multipart uploads are staged here before storage
    pub staging_directory: PathBuf,
}

/// Authentication configuration
///
/// Access and refresh tokens are signed with separate secrets so that a
/// leaked access secret cannot mint refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// Whether auth cookies carry the Secure attribute (off for local dev)
    pub secure_cookies: bool,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub authenticated_rps: u32,
    pub anonymous_rps: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("CLIP_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("CLIP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;

        let public_url = env::var("CLIP_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));
        let cors_origin = env::var("CLIP_CORS_ORIGIN").ok();

        let body_limit = env::var("CLIP_BODY_LIMIT")
            .unwrap_or_else(|_| "16384".to_string()) // 16 KiB, JSON bodies stay small
            .parse()
            .unwrap_or(16384);
        let upload_limit = env::var("CLIP_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "10485760".to_string()) // 10 MiB for avatar/cover uploads
            .parse()
            .unwrap_or(10485760);

        let data_directory: PathBuf = env::var("CLIP_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let account_db = env::var("CLIP_ACCOUNT_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("accounts.sqlite"));
        let media_directory = env::var("CLIP_MEDIA_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("media"));
        let staging_directory = env::var("CLIP_STAGING_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("staging"));

        let access_token_secret = env::var("CLIP_ACCESS_TOKEN_SECRET")
            .map_err(|_| ApiError::Validation("Access token secret required".to_string()))?;
        let refresh_token_secret = env::var("CLIP_REFRESH_TOKEN_SECRET")
            .map_err(|_| ApiError::Validation("Refresh token secret required".to_string()))?;
        let access_token_ttl_secs = env::var("CLIP_ACCESS_TOKEN_TTL")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);
        let refresh_token_ttl_secs = env::var("CLIP_REFRESH_TOKEN_TTL")
            .unwrap_or_else(|_| "864000".to_string()) // 10 days
            .parse()
            .unwrap_or(864000);
        let secure_cookies = env::var("CLIP_SECURE_COOKIES")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let rate_limit_enabled = env::var("CLIP_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let authenticated_rps = env::var("CLIP_RATE_LIMIT_AUTHENTICATED_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);
        let anonymous_rps = env::var("CLIP_RATE_LIMIT_ANONYMOUS_RPS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let burst_size = env::var("CLIP_RATE_LIMIT_BURST")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                cors_origin,
                body_limit,
                upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                account_db,
                media_directory,
                staging_directory,
            },
            authentication: AuthConfig {
                access_token_secret,
                refresh_token_secret,
                access_token_ttl_secs,
                refresh_token_ttl_secs,
                secure_cookies,
            },
            rate_limit: RateLimitSettings {
                enabled: rate_limit_enabled,
                authenticated_rps,
                anonymous_rps,
                burst_size,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.access_token_secret.len() < 32 {
            return Err(ApiError::Validation(
                "Access token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.refresh_token_secret.len() < 32 {
            return Err(ApiError::Validation(
                "Refresh token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.access_token_ttl_secs >= self.authentication.refresh_token_ttl_secs {
            return Err(ApiError::Validation(
                "Refresh token TTL must exceed access token TTL".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".into(),
                port: 8000,
                public_url: "http://localhost:8000".into(),
                cors_origin: None,
                body_limit: 16384,
                upload_limit: 10485760,
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                account_db: "./data/accounts.sqlite".into(),
                media_directory: "./data/media".into(),
                staging_directory: "./data/staging".into(),
            },
            authentication: AuthConfig {
                access_token_secret: "a".repeat(32),
                refresh_token_secret: "b".repeat(32),
                access_token_ttl_secs: 900,
                refresh_token_ttl_secs: 864000,
                secure_cookies: true,
            },
            rate_limit: RateLimitSettings {
                enabled: true,
                authenticated_rps: 100,
                anonymous_rps: 10,
                burst_size: 50,
            },
            logging: LoggingConfig {
                level: "info".into(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = test_config();
        config.authentication.access_token_secret = "short".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refresh_ttl_must_exceed_access_ttl() {
        let mut config = test_config();
        config.authentication.refresh_token_ttl_secs = 60;
        assert!(config.validate().is_err());
    }
}
