//! Chat turn storage.

use super::{days_ago, decode_error, from_millis, to_millis};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use timetalker_conversation::{
    NewTurn, PopularPersona, Turn, group_by_persona,
    limits::{ALL_HISTORY_CAP, SEARCH_CAP},
};
use timetalker_core::UserId;

/// Row type for turn queries.
#[derive(FromRow)]
struct TurnRow {
    id: i64,
    persona_id: String,
    user_id: Option<String>,
    role: String,
    content: String,
    message_type: String,
    created_at: i64,
}

impl TurnRow {
    fn try_into_turn(self) -> Result<Turn, sqlx::Error> {
        let user_id = self
            .user_id
            .map(|raw| {
                raw.parse::<UserId>()
                    .map_err(|e| decode_error(format!("invalid user id '{raw}': {e}")))
            })
            .transpose()?;
        let role = self
            .role
            .parse()
            .map_err(|e| decode_error(format!("turn {}: {e}", self.id)))?;
        let kind = self
            .message_type
            .parse()
            .map_err(|e| decode_error(format!("turn {}: {e}", self.id)))?;
        Ok(Turn {
            id: self.id,
            persona_id: self.persona_id,
            user_id,
            role,
            content: self.content,
            kind,
            timestamp: from_millis(self.created_at),
        })
    }
}

fn into_turns(rows: Vec<TurnRow>) -> Result<Vec<Turn>, sqlx::Error> {
    rows.into_iter().map(TurnRow::try_into_turn).collect()
}

/// Repository for chat turns.
///
/// Turns are append-only. They leave the table through [`clear`](Self::clear),
/// [`clear_all`](Self::clear_all) or retention.
#[derive(Clone)]
pub struct TurnRepository {
    pool: SqlitePool,
}

impl TurnRepository {
    /// Creates a new turn repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a turn stamped with the current time.
    pub async fn append(&self, turn: &NewTurn) -> Result<Turn, sqlx::Error> {
        self.append_at(turn, Utc::now()).await
    }

    /// Appends a turn with an explicit timestamp.
    pub async fn append_at(&self, turn: &NewTurn, at: DateTime<Utc>) -> Result<Turn, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_turns (persona_id, user_id, role, content, message_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&turn.persona_id)
        .bind(turn.user_id.map(|id| id.to_string()))
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(turn.kind.as_str())
        .bind(to_millis(at))
        .execute(&self.pool)
        .await?;

        Ok(Turn {
            id: result.last_insert_rowid(),
            persona_id: turn.persona_id.clone(),
            user_id: turn.user_id,
            role: turn.role,
            content: turn.content.clone(),
            kind: turn.kind,
            timestamp: from_millis(to_millis(at)),
        })
    }

    /// Returns the most recent `limit` turns of one conversation, oldest first.
    ///
    /// `user_id = None` selects the anonymous conversation with the persona.
    pub async fn history(
        &self,
        persona_id: &str,
        user_id: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<Turn>, sqlx::Error> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            r#"
            SELECT id, persona_id, user_id, role, content, message_type, created_at
            FROM (
                SELECT id, persona_id, user_id, role, content, message_type, created_at
                FROM chat_turns
                WHERE persona_id = ? AND user_id IS ?
                ORDER BY created_at DESC, id DESC
                LIMIT ?
            )
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(persona_id)
        .bind(user_id.map(|id| id.to_string()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        into_turns(rows)
    }

    /// Returns the user's most recent turns across every persona, grouped
    /// by persona.
    pub async fn all_for_user(
        &self,
        user_id: UserId,
    ) -> Result<BTreeMap<String, Vec<Turn>>, sqlx::Error> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            r#"
            SELECT id, persona_id, user_id, role, content, message_type, created_at
            FROM chat_turns
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(i64::from(ALL_HISTORY_CAP))
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_persona(into_turns(rows)?))
    }

    /// Deletes one conversation. Returns the number of turns removed.
    pub async fn clear(&self, persona_id: &str, user_id: UserId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_turns
            WHERE persona_id = ? AND user_id = ?
            "#,
        )
        .bind(persona_id)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every conversation of a user.
    pub async fn clear_all(&self, user_id: UserId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_turns
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Case-sensitive substring search over the user's turns, newest first.
    pub async fn search(&self, user_id: UserId, needle: &str) -> Result<Vec<Turn>, sqlx::Error> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            r#"
            SELECT id, persona_id, user_id, role, content, message_type, created_at
            FROM chat_turns
            WHERE user_id = ? AND instr(content, ?) > 0
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(needle)
        .bind(i64::from(SEARCH_CAP))
        .fetch_all(&self.pool)
        .await?;

        into_turns(rows)
    }

    /// Ranks personas by turn count over the trailing `window_days`.
    pub async fn popular(
        &self,
        limit: u32,
        window_days: u32,
    ) -> Result<Vec<PopularPersona>, sqlx::Error> {
        let since = days_ago(window_days);
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT persona_id, COUNT(*) AS chat_count
            FROM chat_turns
            WHERE created_at >= ?
            GROUP BY persona_id
            ORDER BY chat_count DESC, persona_id ASC
            LIMIT ?
            "#,
        )
        .bind(to_millis(since))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(persona_id, count)| PopularPersona {
                persona_id,
                chat_count: u64::try_from(count).unwrap_or_default(),
            })
            .collect())
    }

    /// Deletes turns created before `cutoff`.
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_turns
            WHERE created_at < ?
            "#,
        )
        .bind(to_millis(cutoff))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
