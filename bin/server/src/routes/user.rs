//! Per-user favorites and settings.

use crate::auth::RequireAuth;
use crate::db::{FavoriteRepository, SettingsRepository};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use timetalker_persona::Persona;

/// A favorited persona as listed to its user.
#[derive(Debug, Serialize)]
pub struct FavoritePersona<'a> {
    #[serde(flatten)]
    pub persona: &'a Persona,
    pub is_favorited: bool,
    pub favorited_at: DateTime<Utc>,
}

/// Lists favorites newest first. Favorites of personas no longer in the
/// catalog are skipped.
pub async fn favorites(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<JsonValue>, ApiError> {
    let records = FavoriteRepository::new(state.db_pool.clone())
        .list(auth.user_id())
        .await?;
    let favorites: Vec<FavoritePersona<'_>> = records
        .iter()
        .filter_map(|record| {
            state
                .personas
                .get(&record.persona_id)
                .ok()
                .map(|persona| FavoritePersona {
                    persona,
                    is_favorited: true,
                    favorited_at: record.created_at,
                })
        })
        .collect();
    Ok(Json(json!({ "favorites": favorites })))
}

/// Stored form of a setting value: strings verbatim, anything else as JSON.
fn setting_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Saves every key of the body object, all or nothing.
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Json(body): Json<JsonValue>,
) -> Result<Json<JsonValue>, ApiError> {
    let JsonValue::Object(settings) = body else {
        return Err(ApiError::validation("Settings must be a JSON object"));
    };

    let entries: Vec<(&str, String)> = settings
        .iter()
        .map(|(key, value)| (key.as_str(), setting_text(value)))
        .collect();
    SettingsRepository::new(state.db_pool.clone())
        .set_all(auth.user_id(), &entries)
        .await?;
    let saved: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
    Ok(Json(json!({ "success": true, "saved": saved })))
}

pub async fn settings(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<JsonValue>, ApiError> {
    let settings = SettingsRepository::new(state.db_pool.clone())
        .all(auth.user_id())
        .await?;
    Ok(Json(json!({ "settings": settings })))
}

pub async fn setting(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(key): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let value = SettingsRepository::new(state.db_pool.clone())
        .get(auth.user_id(), &key)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting not found"))?;
    Ok(Json(json!({ "setting_key": key, "setting_value": value })))
}
