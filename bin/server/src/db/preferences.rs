//! Per-persona preference documents.

use super::{decode_error, to_millis};
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::SqlitePool;
use timetalker_core::UserId;

/// Repository for user preferences. Each (user, persona) pair holds one
/// JSON document, replaced wholesale on save.
pub struct PreferenceRepository {
    pool: SqlitePool,
}

impl PreferenceRepository {
    /// Creates a new preference repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replaces the preference document.
    pub async fn save(
        &self,
        user_id: UserId,
        persona_id: &str,
        preferences: &JsonValue,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, persona_id, preference_data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, persona_id)
            DO UPDATE SET preference_data = excluded.preference_data, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.to_string())
        .bind(persona_id)
        .bind(preferences.to_string())
        .bind(to_millis(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the preference document, if one was saved.
    pub async fn get(
        &self,
        user_id: UserId,
        persona_id: &str,
    ) -> Result<Option<JsonValue>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT preference_data
            FROM user_preferences
            WHERE user_id = ? AND persona_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(persona_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(data,)| {
            serde_json::from_str(&data)
                .map_err(|e| decode_error(format!("invalid preference document: {e}")))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use serde_json::json;

    #[tokio::test]
    async fn save_replaces_document() {
        let repo = PreferenceRepository::new(test_pool().await);
        let user = UserId::new();

        assert_eq!(repo.get(user, "socrates").await.expect("get"), None);

        repo.save(user, "socrates", &json!({"tone": "formal", "length": "short"}))
            .await
            .expect("save");
        repo.save(user, "socrates", &json!({"tone": "casual"}))
            .await
            .expect("save");

        assert_eq!(
            repo.get(user, "socrates").await.expect("get"),
            Some(json!({"tone": "casual"}))
        );
    }
}
