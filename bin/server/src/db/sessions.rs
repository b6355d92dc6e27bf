//! Streaming chat sessions, one row per WebSocket connection.

use super::to_millis;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use timetalker_core::{ChatSessionId, UserId};

/// Repository for chat sessions.
#[derive(Clone)]
pub struct ChatSessionRepository {
    pool: SqlitePool,
}

impl ChatSessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a new session and returns its id.
    pub async fn open(
        &self,
        persona_id: &str,
        user_id: Option<UserId>,
    ) -> Result<ChatSessionId, sqlx::Error> {
        let id = ChatSessionId::new();
        let now = to_millis(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO chat_sessions (id, persona_id, user_id, created_at, last_activity)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(persona_id)
        .bind(user_id.map(|id| id.to_string()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Marks a session as active now.
    pub async fn touch(&self, id: ChatSessionId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE chat_sessions
            SET last_activity = ?
            WHERE id = ?
            "#,
        )
        .bind(to_millis(Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes sessions idle since before `cutoff`.
    pub async fn delete_idle(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_sessions
            WHERE last_activity < ?
            "#,
        )
        .bind(to_millis(cutoff))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[cfg(test)]
    async fn last_activity(&self, id: ChatSessionId) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT last_activity FROM chat_sessions WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(at,)| at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn touch_advances_last_activity() {
        let repo = ChatSessionRepository::new(test_pool().await);
        let id = repo.open("socrates", None).await.expect("open");
        let opened = repo.last_activity(id).await.expect("read").expect("row");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.touch(id).await.expect("touch");
        let touched = repo.last_activity(id).await.expect("read").expect("row");
        assert!(touched > opened);
    }

    #[tokio::test]
    async fn delete_idle_spares_active_sessions() {
        let repo = ChatSessionRepository::new(test_pool().await);
        let id = repo.open("einstein", Some(UserId::new())).await.expect("open");

        let deleted = repo
            .delete_idle(Utc::now() - Duration::days(1))
            .await
            .expect("delete");
        assert_eq!(deleted, 0);

        let deleted = repo
            .delete_idle(Utc::now() + Duration::seconds(1))
            .await
            .expect("delete");
        assert_eq!(deleted, 1);
        assert_eq!(repo.last_activity(id).await.expect("read"), None);
    }
}
