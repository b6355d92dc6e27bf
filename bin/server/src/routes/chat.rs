//! Chat routes: text and voice messages, history and search.

use crate::auth::RequireAuth;
use crate::db::TurnRepository;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use timetalker_conversation::{Turn, limits::history_limit};

#[derive(Debug, Deserialize)]
pub struct TextChatRequest {
    pub character_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceChatQuery {
    pub character_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn text(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<TextChatRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    let (Some(character_id), Some(message)) =
        (non_empty(request.character_id), non_empty(request.message))
    else {
        return Err(ApiError::validation("character_id and message are required"));
    };

    let response = state
        .dialogue
        .chat_text(&character_id, Some(auth.user_id()), &message)
        .await?;
    Ok(Json(json!({ "response": response })))
}

/// Voice chat over a multipart upload. Anonymous: the turns carry no user.
pub async fn voice(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoiceChatQuery>,
    mut multipart: Multipart,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&query.character_id)?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload: {}", e)))?
        .ok_or_else(|| ApiError::validation("Audio file is required"))?;
    let audio = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload: {}", e)))?;
    if audio.is_empty() {
        return Err(ApiError::validation("Audio file is empty"));
    }

    let exchange = state
        .dialogue
        .chat_voice(&query.character_id, None, &audio)
        .await?;
    Ok(Json(json!({
        "text": exchange.transcript,
        "response": exchange.reply,
        "audio": STANDARD.encode(&exchange.audio),
    })))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(character_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let turns = TurnRepository::new(state.db_pool.clone())
        .history(&character_id, Some(auth.user_id()), history_limit(query.limit))
        .await?;
    Ok(Json(turns))
}

pub async fn all_history(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<BTreeMap<String, Vec<Turn>>>, ApiError> {
    let grouped = TurnRepository::new(state.db_pool.clone())
        .all_for_user(auth.user_id())
        .await?;
    Ok(Json(grouped))
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(character_id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let deleted = TurnRepository::new(state.db_pool.clone())
        .clear(&character_id, auth.user_id())
        .await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn clear_all_history(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<JsonValue>, ApiError> {
    let deleted = TurnRepository::new(state.db_pool.clone())
        .clear_all(auth.user_id())
        .await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    if query.query.is_empty() {
        return Err(ApiError::validation("query is required"));
    }
    let turns = TurnRepository::new(state.db_pool.clone())
        .search(auth.user_id(), &query.query)
        .await?;
    Ok(Json(turns))
}
