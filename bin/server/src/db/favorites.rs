//! Favorite personas per user.

use super::{from_millis, to_millis};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use timetalker_conversation::{FavoriteOutcome, UnfavoriteOutcome};
use timetalker_core::UserId;

/// A persona a user has favorited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecord {
    pub persona_id: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for user favorites.
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
    /// Creates a new favorite repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Favorites a persona. Favoriting twice is not an error.
    pub async fn add(
        &self,
        user_id: UserId,
        persona_id: &str,
    ) -> Result<FavoriteOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_favorites (user_id, persona_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id.to_string())
        .bind(persona_id)
        .bind(to_millis(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(FavoriteOutcome::from(result.rows_affected() > 0))
    }

    /// Removes a favorite.
    pub async fn remove(
        &self,
        user_id: UserId,
        persona_id: &str,
    ) -> Result<UnfavoriteOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_favorites
            WHERE user_id = ? AND persona_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(persona_id)
        .execute(&self.pool)
        .await?;

        Ok(UnfavoriteOutcome::from(result.rows_affected() > 0))
    }

    /// Lists a user's favorites, newest first.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<FavoriteRecord>, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT persona_id, created_at
            FROM user_favorites
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(persona_id, created_at)| FavoriteRecord {
                persona_id,
                created_at: from_millis(created_at),
            })
            .collect())
    }

    /// Checks whether a user has favorited a persona.
    pub async fn is_favorited(&self, user_id: UserId, persona_id: &str) -> Result<bool, sqlx::Error> {
        let found: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT 1
            FROM user_favorites
            WHERE user_id = ? AND persona_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(persona_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }
}
