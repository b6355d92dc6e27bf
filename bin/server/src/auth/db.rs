//! Database repository for user accounts.

use crate::db::{decode_error, from_millis, to_millis};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use timetalker_core::UserId;
use timetalker_platform_access::User;

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    avatar_url: Option<String>,
    is_active: bool,
    created_at: i64,
    last_login: Option<i64>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, sqlx::Error> {
        let id = UserId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {}", self.id, e)))?;
        Ok(User::with_all_fields(
            id,
            self.username,
            self.email,
            self.password_hash,
            self.avatar_url,
            self.is_active,
            from_millis(self.created_at),
            self.last_login.map(from_millis),
        ))
    }
}

/// Repository for user operations.
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new user.
    ///
    /// A duplicate username or email fails with a unique-constraint
    /// violation; see [`crate::db::is_unique_violation`].
    pub async fn create(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, avatar_url, is_active, created_at, last_login)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.username())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.avatar_url())
        .bind(user.is_active())
        .bind(to_millis(user.created_at()))
        .bind(user.last_login().map(to_millis))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds a user by their internal ID.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, avatar_url, is_active, created_at, last_login
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    /// Finds a user whose username or email equals `login`.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, password_hash, avatar_url, is_active, created_at, last_login
            FROM users
            WHERE username = ? OR email = ?
            "#,
        )
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    /// Checks whether another account already uses `username` or `email`.
    pub async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1
            FROM users
            WHERE (username = ? OR email = ?) AND id IS NOT ?
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(except.map(|id| id.to_string()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    /// Persists the mutable profile fields of a user.
    pub async fn update_profile(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, avatar_url = ?
            WHERE id = ?
            "#,
        )
        .bind(user.username())
        .bind(user.email())
        .bind(user.avatar_url())
        .bind(user.id().to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces a user's password hash.
    pub async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stamps a successful login.
    pub async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_login = ?
            WHERE id = ?
            "#,
        )
        .bind(to_millis(at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-deletes a user. Returns false if no such user exists.
    pub async fn deactivate(&self, id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = 0
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{is_unique_violation, test_pool};

    fn alice() -> User {
        User::new(
            "alice".to_string(),
            "a@x.com".to_string(),
            "pbkdf2-sha256$1000$c2FsdA$aGFzaA".to_string(),
        )
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = UserRepository::new(test_pool().await);
        let user = alice();
        repo.create(&user).await.expect("create");

        let by_id = repo.find_by_id(user.id()).await.expect("find").expect("exists");
        assert_eq!(by_id.username(), "alice");
        assert_eq!(by_id.password_hash(), user.password_hash());

        let by_email = repo.find_by_login("a@x.com").await.expect("find").expect("exists");
        assert_eq!(by_email.id(), user.id());
        assert!(repo.find_by_login("bob").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_unique_violation() {
        let repo = UserRepository::new(test_pool().await);
        repo.create(&alice()).await.expect("create");

        let err = repo.create(&alice()).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn identity_taken_ignores_self() {
        let repo = UserRepository::new(test_pool().await);
        let user = alice();
        repo.create(&user).await.expect("create");

        assert!(repo.identity_taken("alice", "new@x.com", None).await.expect("check"));
        assert!(!repo
            .identity_taken("alice", "a@x.com", Some(user.id()))
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn deactivate_and_login_stamp() {
        let repo = UserRepository::new(test_pool().await);
        let user = alice();
        repo.create(&user).await.expect("create");

        let at = from_millis(to_millis(Utc::now()));
        repo.record_login(user.id(), at).await.expect("login");
        assert!(repo.deactivate(user.id()).await.expect("deactivate"));
        assert!(!repo.deactivate(UserId::new()).await.expect("deactivate"));

        let stored = repo.find_by_id(user.id()).await.expect("find").expect("exists");
        assert!(!stored.is_active());
        assert_eq!(stored.last_login(), Some(at));
    }
}
