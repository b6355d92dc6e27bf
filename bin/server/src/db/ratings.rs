//! Persona ratings.

use super::to_millis;
use chrono::Utc;
use sqlx::SqlitePool;
use timetalker_conversation::RatingSummary;

/// Repository for ratings. Individual ratings are never read back, only
/// aggregated.
pub struct RatingRepository {
    pool: SqlitePool,
}

impl RatingRepository {
    /// Creates a new rating repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a rating already validated to 1..=5.
    pub async fn record(
        &self,
        persona_id: &str,
        rating: u8,
        feedback: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO character_ratings (persona_id, rating, feedback, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(persona_id)
        .bind(i64::from(rating))
        .bind(feedback)
        .bind(to_millis(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mean and count of a persona's ratings.
    pub async fn summary(&self, persona_id: &str) -> Result<RatingSummary, sqlx::Error> {
        let (mean, count): (Option<f64>, i64) = sqlx::query_as(
            r#"
            SELECT AVG(rating), COUNT(*)
            FROM character_ratings
            WHERE persona_id = ?
            "#,
        )
        .bind(persona_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingSummary::new(mean, u64::try_from(count).unwrap_or_default()))
    }
}
