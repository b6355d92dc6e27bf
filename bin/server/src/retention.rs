//! Age-based cleanup of chat history and idle sessions.

use crate::config::RetentionConfig;
use crate::db::{ChatSessionRepository, TurnRepository, days_ago};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

/// Rows removed by one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub turns: u64,
    pub sessions: u64,
}

/// Deletes turns and idle sessions older than `history_days`.
pub async fn cleanup(pool: &SqlitePool, history_days: u32) -> Result<CleanupReport, sqlx::Error> {
    let cutoff = days_ago(history_days);
    let turns = TurnRepository::new(pool.clone())
        .delete_older_than(cutoff)
        .await?;
    let sessions = ChatSessionRepository::new(pool.clone())
        .delete_idle(cutoff)
        .await?;
    Ok(CleanupReport { turns, sessions })
}

async fn run_once(pool: &SqlitePool, history_days: u32) {
    match cleanup(pool, history_days).await {
        Ok(report) if report.turns > 0 || report.sessions > 0 => {
            tracing::info!(
                deleted_turns = report.turns,
                deleted_sessions = report.sessions,
                "Retention cleanup"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Retention cleanup failed");
        }
    }
}

/// Runs cleanup now and then on every interval tick.
pub fn spawn(pool: SqlitePool, config: RetentionConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(config.cleanup_interval_seconds.max(1));
        let mut interval = tokio::time::interval(period);
        loop {
            // The first tick completes immediately.
            interval.tick().await;
            run_once(&pool, config.history_days).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::{Duration, Utc};
    use timetalker_conversation::{MessageKind, NewTurn};

    #[tokio::test]
    async fn cleanup_removes_expired_turns() {
        let pool = test_pool().await;
        let turns = TurnRepository::new(pool.clone());
        let stale = Utc::now() - Duration::days(45);
        turns
            .append_at(&NewTurn::user("socrates", None, "old", MessageKind::Text), stale)
            .await
            .expect("append");
        turns
            .append(&NewTurn::user("socrates", None, "fresh", MessageKind::Text))
            .await
            .expect("append");
        ChatSessionRepository::new(pool.clone())
            .open("socrates", None)
            .await
            .expect("open");

        let report = cleanup(&pool, 30).await.expect("cleanup");
        assert_eq!(report, CleanupReport { turns: 1, sessions: 0 });

        let left = turns.history("socrates", None, 50).await.expect("history");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].content, "fresh");
    }

    #[tokio::test]
    async fn oversized_history_window_keeps_everything() {
        let pool = test_pool().await;
        let turns = TurnRepository::new(pool.clone());
        turns
            .append_at(
                &NewTurn::user("socrates", None, "ancient", MessageKind::Text),
                Utc::now() - Duration::days(3650),
            )
            .await
            .expect("append");

        let report = cleanup(&pool, u32::MAX).await.expect("cleanup");
        assert_eq!(report, CleanupReport::default());
    }
}
