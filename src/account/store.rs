/// Credential store over the account table
///
/// Owns password hashing and comparison; no other module touches the
/// password column. All writes are single-statement updates.
use crate::{
    account::{self, NewAccount},
    db::account::{Account, WatchHistoryEntry},
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Account persistence and credential checks
pub struct AccountStore {
    db: SqlitePool,
}

impl AccountStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Fail with `Conflict` if the normalized username or email is taken
    pub async fn ensure_available(&self, username: &str, email: &str) -> ApiResult<()> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM account WHERE username = ?1 OR email = ?2",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::Database)?;

        if count > 0 {
            return Err(ApiError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a new account
    ///
    /// Username and email are normalized before the uniqueness check, and
    /// the plaintext password is hashed here, exactly once. Returns the
    /// record re-read from the database so callers see what was persisted.
    pub async fn create(&self, profile: NewAccount, password: &str) -> ApiResult<Account> {
        let username = account::normalize_identifier(&profile.username);
        let email = account::normalize_identifier(&profile.email);

        self.ensure_available(&username, &email).await?;

        let password_hash = account::hash_password(password)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO account (id, username, email, display_name, password_hash,
                                  avatar_url, cover_image_url, refresh_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)",
        )
        .bind(&id)
        .bind(&username)
        .bind(&email)
        .bind(profile.display_name.trim())
        .bind(&password_hash)
        .bind(&profile.avatar_url)
        .bind(&profile.cover_image_url)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        // Re-read to confirm the record landed
        self.find_by_id(&id)
            .await
            .map_err(|_| ApiError::Internal("Account missing after registration".to_string()))
    }

    /// One-way password comparison against the stored hash
    pub async fn verify_password(&self, account: &Account, password: &str) -> ApiResult<bool> {
        account::verify_password(password, &account.password_hash)
    }

    /// Get account by id
    pub async fn find_by_id(&self, id: &str) -> ApiResult<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM account WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    /// Find account by username or email, whichever matches
    pub async fn find_by_username_or_email(&self, identifier: &str) -> ApiResult<Account> {
        let identifier = account::normalize_identifier(identifier);
        sqlx::query_as::<_, Account>(
            "SELECT * FROM account WHERE username = ?1 OR email = ?1",
        )
        .bind(&identifier)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Account does not exist".to_string()))
    }

    /// Update display name and email
    ///
    /// The new email must not belong to another account.
    pub async fn update_profile(
        &self,
        id: &str,
        display_name: &str,
        email: &str,
    ) -> ApiResult<Account> {
        let email = account::normalize_identifier(email);

        if let Ok(existing) = self.find_by_username_or_email(&email).await {
            if existing.id != id {
                return Err(ApiError::Conflict("Email already registered".to_string()));
            }
        }

        sqlx::query(
            "UPDATE account SET display_name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(display_name.trim())
        .bind(&email)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        self.find_by_id(id).await
    }

    /// Replace the avatar reference
    pub async fn update_avatar(&self, id: &str, avatar_url: &str) -> ApiResult<Account> {
        sqlx::query("UPDATE account SET avatar_url = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(avatar_url)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        self.find_by_id(id).await
    }

    /// Replace the cover image reference
    pub async fn update_cover(&self, id: &str, cover_image_url: &str) -> ApiResult<Account> {
        sqlx::query("UPDATE account SET cover_image_url = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(cover_image_url)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        self.find_by_id(id).await
    }

    /// Set or clear the stored refresh token
    ///
    /// Replacing the value invalidates the previous token for future refresh
    /// attempts; `None` logs the account out of the refresh flow entirely.
    pub async fn set_refresh_token(&self, id: &str, token: Option<&str>) -> ApiResult<()> {
        sqlx::query("UPDATE account SET refresh_token = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Atomically swap the stored refresh token
    ///
    /// Compare-and-swap: the update only lands if the stored value still
    /// equals `presented`. Returns false when the token was already rotated
    /// by a concurrent refresh or cleared by logout.
    pub async fn rotate_refresh_token(
        &self,
        id: &str,
        presented: &str,
        replacement: &str,
    ) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE account SET refresh_token = ?1, updated_at = ?2
             WHERE id = ?3 AND refresh_token = ?4",
        )
        .bind(replacement)
        .bind(Utc::now())
        .bind(id)
        .bind(presented)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Set a new password
    ///
    /// The only update path that re-hashes; every other patch writes its
    /// fields verbatim so a stored hash is never hashed twice.
    pub async fn update_password(&self, id: &str, new_password: &str) -> ApiResult<()> {
        let password_hash = account::hash_password(new_password)?;

        sqlx::query("UPDATE account SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Watched content for an account, oldest first
    pub async fn watch_history(&self, account_id: &str) -> ApiResult<Vec<WatchHistoryEntry>> {
        sqlx::query_as::<_, WatchHistoryEntry>(
            "SELECT account_id, content_id, watched_at FROM watch_history
             WHERE account_id = ?1 ORDER BY watched_at",
        )
        .bind(account_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use chrono::{Duration, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> AccountStore {
        // Single connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        AccountStore::new(pool)
    }

    fn profile(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.into(),
            email: email.into(),
            display_name: "Test User".into(),
            avatar_url: "http://localhost/media/avatar.png".into(),
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let store = test_store().await;

        let account = store
            .create(profile("alice", "alice@example.com"), "s3cret-pass")
            .await
            .unwrap();

        assert_ne!(account.password_hash, "s3cret-pass");
        assert!(store.verify_password(&account, "s3cret-pass").await.unwrap());
        assert!(!store.verify_password(&account, "wrong").await.unwrap());
        assert!(account.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts_case_insensitively() {
        let store = test_store().await;
        store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();

        let err = store
            .create(profile("  ALICE ", "other@example.com"), "pw-one-two")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = store
            .create(profile("bob", "Alice@Example.COM"), "pw-one-two")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // The failed attempts persisted nothing
        assert!(store.find_by_username_or_email("bob").await.is_err());
    }

    #[tokio::test]
    async fn test_find_by_username_or_email() {
        let store = test_store().await;
        store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();

        let by_name = store.find_by_username_or_email("Alice").await.unwrap();
        let by_mail = store
            .find_by_username_or_email("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_name.id, by_mail.id);

        assert!(matches!(
            store.find_by_username_or_email("nobody").await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_rotate_refresh_token_is_single_use() {
        let store = test_store().await;
        let account = store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();

        store
            .set_refresh_token(&account.id, Some("token-r1"))
            .await
            .unwrap();

        // First rotation wins
        assert!(store
            .rotate_refresh_token(&account.id, "token-r1", "token-r2")
            .await
            .unwrap());

        // Replaying the superseded token loses the swap
        assert!(!store
            .rotate_refresh_token(&account.id, "token-r1", "token-r3")
            .await
            .unwrap());

        let stored = store.find_by_id(&account.id).await.unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("token-r2"));
    }

    #[tokio::test]
    async fn test_clearing_refresh_token_blocks_rotation() {
        let store = test_store().await;
        let account = store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();

        store
            .set_refresh_token(&account.id, Some("token-r1"))
            .await
            .unwrap();
        store.set_refresh_token(&account.id, None).await.unwrap();

        assert!(!store
            .rotate_refresh_token(&account.id, "token-r1", "token-r2")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_update_password_invalidates_old() {
        let store = test_store().await;
        let account = store
            .create(profile("alice", "alice@example.com"), "old-password")
            .await
            .unwrap();

        store
            .update_password(&account.id, "new-password")
            .await
            .unwrap();

        let updated = store.find_by_id(&account.id).await.unwrap();
        assert!(!store.verify_password(&updated, "old-password").await.unwrap());
        assert!(store.verify_password(&updated, "new-password").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_password_updates_leave_hash_alone() {
        let store = test_store().await;
        let account = store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();

        let updated = store
            .update_profile(&account.id, "Alice Liddell", "wonder@example.com")
            .await
            .unwrap();

        // Hash untouched by a profile patch; the old password still verifies
        assert_eq!(updated.password_hash, account.password_hash);
        assert_eq!(updated.display_name, "Alice Liddell");
        assert_eq!(updated.email, "wonder@example.com");
        assert!(store.verify_password(&updated, "pw-one-two").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let store = test_store().await;
        store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();
        let bob = store
            .create(profile("bob", "bob@example.com"), "pw-one-two")
            .await
            .unwrap();

        let err = store
            .update_profile(&bob.id, "Bob", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_watch_history_is_ordered() {
        let store = test_store().await;
        let account = store
            .create(profile("alice", "alice@example.com"), "pw-one-two")
            .await
            .unwrap();

        let base = Utc::now();
        for (i, content) in ["clip-c", "clip-a", "clip-b"].iter().enumerate() {
            sqlx::query(
                "INSERT INTO watch_history (account_id, content_id, watched_at)
                 VALUES (?1, ?2, ?3)",
            )
            .bind(&account.id)
            .bind(content)
            .bind(base + Duration::seconds(i as i64))
            .execute(&store.db)
            .await
            .unwrap();
        }

        let history = store.watch_history(&account.id).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|e| e.content_id.as_str()).collect();
        assert_eq!(ids, vec!["clip-c", "clip-a", "clip-b"]);
    }
}
