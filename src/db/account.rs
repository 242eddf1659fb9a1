/// Account database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database
///
/// `password_hash` only ever holds an Argon2id PHC string; the plaintext is
/// hashed before any insert or update touches this table. `refresh_token`
/// mirrors the single live refresh token, or NULL when logged out.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Directed subscription edge: `subscriber_id` follows `channel_id`
///
/// Written by the subscription service; this crate only reads it for the
/// channel profile aggregation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

/// One watched item in an account's history
///
/// Rows are appended by the playback service; ordering is by `watched_at`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WatchHistoryEntry {
    pub account_id: String,
    pub content_id: String,
    pub watched_at: DateTime<Utc>,
}
