/// Channel profile aggregation
///
/// Reads the subscription relation to answer "who is this channel" from a
/// viewer's perspective. This module never writes subscription edges.
use crate::{
    account,
    error::{ApiError, ApiResult},
};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Viewer-relative channel profile; public-safe fields only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub display_name: String,
    pub username: String,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
    pub avatar: String,
    pub cover_image: String,
    pub email: String,
}

/// Aggregation queries over accounts and subscriptions
pub struct ChannelQuery {
    db: SqlitePool,
}

impl ChannelQuery {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Resolve a channel profile as seen by `viewer_id`
    ///
    /// Single query: subscriber count (edges into the channel), subscribed-to
    /// count (edges out of it), and whether the viewer is among the
    /// subscribers.
    pub async fn profile(&self, username: &str, viewer_id: &str) -> ApiResult<ChannelProfile> {
        let username = account::normalize_identifier(username);
        if username.is_empty() {
            return Err(ApiError::Validation("Username is required".to_string()));
        }

        let row = sqlx::query(
            "SELECT a.display_name, a.username, a.email, a.avatar_url, a.cover_image_url,
                    (SELECT COUNT(*) FROM subscription s WHERE s.channel_id = a.id)
                        AS subscriber_count,
                    (SELECT COUNT(*) FROM subscription s WHERE s.subscriber_id = a.id)
                        AS subscribed_to_count,
                    EXISTS(SELECT 1 FROM subscription s
                           WHERE s.channel_id = a.id AND s.subscriber_id = ?2)
                        AS is_subscribed
             FROM account a WHERE a.username = ?1",
        )
        .bind(&username)
        .bind(viewer_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Channel does not exist".to_string()))?;

        let cover_image: Option<String> = row.try_get("cover_image_url")?;

        Ok(ChannelProfile {
            display_name: row.try_get("display_name")?,
            username: row.try_get("username")?,
            subscriber_count: row.try_get("subscriber_count")?,
            subscribed_to_count: row.try_get("subscribed_to_count")?,
            is_subscribed: row.try_get("is_subscribed")?,
            avatar: row.try_get("avatar_url")?,
            cover_image: cover_image.unwrap_or_default(),
            email: row.try_get("email")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountStore, NewAccount};
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn make_account(store: &AccountStore, username: &str) -> String {
        store
            .create(
                NewAccount {
                    username: username.into(),
                    email: format!("{}@example.com", username),
                    display_name: username.to_uppercase(),
                    avatar_url: format!("http://localhost/media/{}.png", username),
                    cover_image_url: None,
                },
                "password-123",
            )
            .await
            .unwrap()
            .id
    }

    async fn subscribe(pool: &SqlitePool, subscriber: &str, channel: &str) {
        sqlx::query(
            "INSERT INTO subscription (subscriber_id, channel_id, created_at)
             VALUES (?1, ?2, ?3)",
        )
        .bind(subscriber)
        .bind(channel)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_counts_and_viewer_flag() {
        let pool = test_pool().await;
        let store = AccountStore::new(pool.clone());
        let channels = ChannelQuery::new(pool.clone());

        let target = make_account(&store, "channel").await;
        let fan1 = make_account(&store, "fan1").await;
        let fan2 = make_account(&store, "fan2").await;
        let fan3 = make_account(&store, "fan3").await;
        let other = make_account(&store, "other").await;

        // Three incoming edges, one outgoing
        subscribe(&pool, &fan1, &target).await;
        subscribe(&pool, &fan2, &target).await;
        subscribe(&pool, &fan3, &target).await;
        subscribe(&pool, &target, &other).await;

        // Viewed by a subscriber
        let profile = channels.profile("channel", &fan2).await.unwrap();
        assert_eq!(profile.subscriber_count, 3);
        assert_eq!(profile.subscribed_to_count, 1);
        assert!(profile.is_subscribed);

        // Viewed by a non-subscriber
        let profile = channels.profile("channel", &other).await.unwrap();
        assert_eq!(profile.subscriber_count, 3);
        assert!(!profile.is_subscribed);
    }

    #[tokio::test]
    async fn test_profile_projects_public_fields_only() {
        let pool = test_pool().await;
        let store = AccountStore::new(pool.clone());
        let channels = ChannelQuery::new(pool.clone());

        let target = make_account(&store, "channel").await;
        let profile = channels.profile("Channel", &target).await.unwrap();

        assert_eq!(profile.username, "channel");
        assert_eq!(profile.display_name, "CHANNEL");
        assert_eq!(profile.cover_image, "");
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshToken").is_none());
    }

    #[tokio::test]
    async fn test_unknown_channel_is_not_found() {
        let pool = test_pool().await;
        let channels = ChannelQuery::new(pool);

        let err = channels.profile("nobody", "viewer").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_username_is_rejected() {
        let pool = test_pool().await;
        let channels = ChannelQuery::new(pool);

        let err = channels.profile("   ", "viewer").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
