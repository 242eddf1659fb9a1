/// Account management
///
/// Holds the credential store, password hashing, and the request/response
/// types for the account lifecycle operations.

mod password;
mod store;

pub use password::{hash_password, verify_password};
pub use store::AccountStore;

use crate::db::account::Account;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalize a username or email for storage and lookup
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Profile fields for a new account; password travels separately
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

/// Public-safe projection of an account
///
/// Never carries the password hash or the stored refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            display_name: account.display_name,
            avatar: account.avatar_url,
            cover_image: account.cover_image_url.unwrap_or_default(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Login request; either username or email identifies the account
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Login response body; tokens are also set as http-only cookies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: AccountView,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token refresh request; the token may also arrive via cookie
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Token refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Change password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Profile field update; both fields are required
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Watched content reference returned by the history endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItem {
    pub content_id: String,
    pub watched_at: DateTime<Utc>,
}
