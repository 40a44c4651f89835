//! User store: subject lookup and token-expiry persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use super::StoreError;

/// A registered user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Persisted expiry driving background cleanup. Distinct from the
    /// expiry embedded in the token itself; last write wins.
    #[serde(skip_serializing)]
    pub token_expiration: Option<DateTime<Utc>>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub token_expiration: Option<DateTime<Utc>>,
}

/// Store of registered users.
///
/// Principals are always looked up fresh per request so a deleted or
/// changed user takes effect immediately; nothing here is cached.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user and return it.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Look up a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Whether a user with this email exists.
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Set (or clear, with `None`) the persisted token expiry.
    async fn set_token_expiration(
        &self,
        user_id: i64,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// All users whose persisted token expiry is before `now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<User>, StoreError>;
}

/// SQLite implementation over an sqlx pool.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone, created_at, token_expiration";

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, phone, created_at, token_expiration) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.phone)
        .bind(created_at)
        .bind(new_user.token_expiration)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::UserNotFound(id))?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(1) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn set_token_expiration(
        &self,
        user_id: i64,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET token_expiration = ? WHERE id = ?")
            .bind(expiration)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(user_id));
        }
        Ok(())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE token_expiration IS NOT NULL AND token_expiration < ?"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_store() -> SqliteUserStore {
        // A single connection keeps the in-memory database alive and shared.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteUserStore::new(pool)
    }

    fn new_user(email: &str, expiration: Option<DateTime<Utc>>) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            phone: None,
            token_expiration: expiration,
        }
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let store = test_store().await;
        let created = store
            .create(new_user("alice@example.com", None))
            .await
            .unwrap();

        let found = store.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);
        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
        assert!(store.exists_by_email("alice@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn find_expired_filters_on_persisted_expiry() {
        let store = test_store().await;
        let now = Utc::now();

        let expired = store
            .create(new_user("expired@example.com", Some(now - Duration::minutes(5))))
            .await
            .unwrap();
        store
            .create(new_user("live@example.com", Some(now + Duration::minutes(60))))
            .await
            .unwrap();
        store
            .create(new_user("never@example.com", None))
            .await
            .unwrap();

        let found = store.find_expired(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, expired.id);
    }

    #[tokio::test]
    async fn set_token_expiration_last_write_wins() {
        let store = test_store().await;
        let user = store
            .create(new_user("alice@example.com", None))
            .await
            .unwrap();
        let now = Utc::now();

        store
            .set_token_expiration(user.id, Some(now - Duration::minutes(1)))
            .await
            .unwrap();
        assert_eq!(store.find_expired(now).await.unwrap().len(), 1);

        // A later write replaces the earlier expiry outright.
        store
            .set_token_expiration(user.id, Some(now + Duration::minutes(60)))
            .await
            .unwrap();
        assert!(store.find_expired(now).await.unwrap().is_empty());

        store.set_token_expiration(user.id, None).await.unwrap();
        assert!(store.find_expired(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_token_expiration_unknown_user_errors() {
        let store = test_store().await;
        let err = store.set_token_expiration(42, None).await.unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(42)));
    }
}
