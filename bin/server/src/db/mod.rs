//! SQLite repositories for the conversation store.
//!
//! This module provides data access for:
//! - Chat turns (history, search, popularity, retention)
//! - Favorites, settings, ratings and per-persona preferences
//! - Streaming chat sessions
//!
//! Users live in [`crate::auth::db`]. Every timestamp column holds unix
//! milliseconds.

pub mod favorites;
pub mod preferences;
pub mod ratings;
pub mod sessions;
pub mod settings;
pub mod turns;

pub use favorites::{FavoriteRecord, FavoriteRepository};
pub use preferences::PreferenceRepository;
pub use ratings::RatingRepository;
pub use sessions::ChatSessionRepository;
pub use settings::SettingsRepository;
pub use turns::TurnRepository;

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Opens the connection pool, creating the database file if needed.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the database cannot be opened.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Applies pending schema migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// The instant `days` days before now, saturating at the earliest
/// representable time.
pub(crate) fn days_ago(days: u32) -> DateTime<Utc> {
    Utc::now()
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub(crate) fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

/// Returns true if `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// A migrated in-memory database. One connection, kept open for the
/// lifetime of the pool, so every query sees the same database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    migrate(&pool).await.expect("run migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_trip() {
        let at = from_millis(1_700_000_000_123);
        assert_eq!(to_millis(at), 1_700_000_000_123);
    }

    #[test]
    fn days_ago_saturates() {
        assert_eq!(days_ago(u32::MAX), DateTime::<Utc>::MIN_UTC);
        let before = Utc::now();
        let at = days_ago(7);
        let after = Utc::now();
        assert!(before - Duration::days(7) <= at && at <= after - Duration::days(7));
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}", dir.path().join("chat.db").display());
        let pool = connect(&url).await.expect("connect");
        migrate(&pool).await.expect("migrate");
        assert!(dir.path().join("chat.db").exists());
    }
}
