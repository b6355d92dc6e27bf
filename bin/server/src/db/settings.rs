//! Per-user key/value settings.

use super::to_millis;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use timetalker_core::UserId;

const UPSERT: &str = r#"
    INSERT INTO user_settings (user_id, setting_key, setting_value, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT (user_id, setting_key)
    DO UPDATE SET setting_value = excluded.setting_value, updated_at = excluded.updated_at
"#;

/// Repository for user settings. Saving an existing key overwrites it.
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Saves a setting, replacing any previous value.
    pub async fn set(&self, user_id: UserId, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let now = to_millis(Utc::now());
        sqlx::query(UPSERT)
            .bind(user_id.to_string())
            .bind(key)
            .bind(value)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Saves several settings in one transaction: either every entry is
    /// stored or none is.
    pub async fn set_all(
        &self,
        user_id: UserId,
        entries: &[(&str, String)],
    ) -> Result<(), sqlx::Error> {
        let now = to_millis(Utc::now());
        let user_id = user_id.to_string();
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(UPSERT)
                .bind(&user_id)
                .bind(*key)
                .bind(value)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    /// Reads one setting.
    pub async fn get(&self, user_id: UserId, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT setting_value
            FROM user_settings
            WHERE user_id = ? AND setting_key = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Reads every setting of a user.
    pub async fn all(&self, user_id: UserId) -> Result<BTreeMap<String, String>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT setting_key, setting_value
            FROM user_settings
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn last_write_wins() {
        let repo = SettingsRepository::new(test_pool().await);
        let user = UserId::new();

        repo.set(user, "theme", "dark").await.expect("set");
        assert_eq!(repo.get(user, "theme").await.expect("get").as_deref(), Some("dark"));

        repo.set(user, "theme", "light").await.expect("set");
        assert_eq!(repo.get(user, "theme").await.expect("get").as_deref(), Some("light"));
        assert_eq!(repo.all(user).await.expect("all").len(), 1);
    }

    #[tokio::test]
    async fn batch_is_saved_together() {
        let repo = SettingsRepository::new(test_pool().await);
        let user = UserId::new();

        repo.set_all(user, &[("theme", "dark".to_string()), ("lang", "en".to_string())])
            .await
            .expect("set_all");
        let all = repo.all(user).await.expect("all");
        assert_eq!(all.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(all.get("lang").map(String::as_str), Some("en"));
    }

    #[tokio::test]
    async fn failed_batch_saves_nothing() {
        let pool = test_pool().await;
        sqlx::query(
            r#"
            CREATE TRIGGER reject_broken BEFORE INSERT ON user_settings
            WHEN NEW.setting_key = 'broken'
            BEGIN SELECT RAISE(ABORT, 'rejected'); END
            "#,
        )
        .execute(&pool)
        .await
        .expect("trigger");
        let repo = SettingsRepository::new(pool);
        let user = UserId::new();

        let result = repo
            .set_all(user, &[("theme", "dark".to_string()), ("broken", "x".to_string())])
            .await;
        assert!(result.is_err());
        assert!(repo.all(user).await.expect("all").is_empty());
    }

    #[tokio::test]
    async fn unknown_key_is_none() {
        let repo = SettingsRepository::new(test_pool().await);
        assert_eq!(repo.get(UserId::new(), "missing").await.expect("get"), None);
    }
}
