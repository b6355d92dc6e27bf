//! Persona catalog, favorites, ratings, preferences and skills.

use crate::auth::RequireAuth;
use crate::db::{FavoriteRepository, PreferenceRepository, RatingRepository, TurnRepository};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use timetalker_conversation::limits::{DEFAULT_POPULAR_LIMIT, POPULAR_WINDOW_DAYS};
use timetalker_conversation::validate_rating;
use timetalker_persona::Persona;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<u32>,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: i64,
    pub feedback: Option<String>,
}

fn cloned(personas: Vec<&Persona>) -> Vec<Persona> {
    personas.into_iter().cloned().collect()
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Persona>> {
    Json(state.personas.list().to_vec())
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Persona>> {
    Json(cloned(state.personas.search(&query.query)))
}

pub async fn categories(State(state): State<Arc<AppState>>) -> Json<JsonValue> {
    Json(json!({ "categories": state.personas.categories() }))
}

pub async fn by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<Vec<Persona>> {
    Json(cloned(state.personas.by_category(&category)))
}

/// Personas ranked by turn count over a trailing window (7 days unless
/// `days` is given).
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<JsonValue>, ApiError> {
    let ranked = TurnRepository::new(state.db_pool.clone())
        .popular(
            query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT),
            query.days.unwrap_or(POPULAR_WINDOW_DAYS),
        )
        .await?;
    Ok(Json(json!({ "popular": ranked })))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Persona>, ApiError> {
    Ok(Json(state.personas.get(&id)?.clone()))
}

pub async fn skills(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let skills = state.personas.skills(&id)?;
    Ok(Json(json!({ "character_id": id, "skills": skills })))
}

/// Invokes a named skill. The body is the parameter object and may be empty.
pub async fn use_skill(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path((id, skill)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<JsonValue>, ApiError> {
    let params: JsonValue = if body.iter().all(u8::is_ascii_whitespace) {
        JsonValue::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid skill parameters: {}", e)))?
    };

    let outcome = state
        .dialogue
        .use_skill(&id, &skill, &params, Some(auth.user_id()))
        .await?;
    Ok(Json(json!({
        "success": true,
        "skill": outcome.skill,
        "result": outcome.result,
        "persona": outcome.persona,
    })))
}

pub async fn favorite(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    let outcome = FavoriteRepository::new(state.db_pool.clone())
        .add(auth.user_id(), &id)
        .await?;
    Ok(Json(json!({
        "success": outcome.changed(),
        "message": outcome.message(),
    })))
}

pub async fn unfavorite(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    let outcome = FavoriteRepository::new(state.db_pool.clone())
        .remove(auth.user_id(), &id)
        .await?;
    Ok(Json(json!({
        "success": outcome.changed(),
        "message": outcome.message(),
    })))
}

pub async fn favorite_status(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    let is_favorited = FavoriteRepository::new(state.db_pool.clone())
        .is_favorited(auth.user_id(), &id)
        .await?;
    Ok(Json(json!({ "character_id": id, "is_favorited": is_favorited })))
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    RequireAuth(_auth): RequireAuth,
    Path(id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    let rating = validate_rating(request.rating).map_err(|e| ApiError::validation(e.to_string()))?;
    let feedback = request.feedback.as_deref().filter(|f| !f.trim().is_empty());

    RatingRepository::new(state.db_pool.clone())
        .record(&id, rating, feedback)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Rating submitted" })))
}

pub async fn rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    let summary = RatingRepository::new(state.db_pool.clone())
        .summary(&id)
        .await?;
    Ok(Json(json!({
        "character_id": id,
        "average_rating": summary.average_rating,
        "total_ratings": summary.total_ratings,
    })))
}

pub async fn preferences(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    let preferences = PreferenceRepository::new(state.db_pool.clone())
        .get(auth.user_id(), &id)
        .await?
        .unwrap_or_else(|| json!({}));
    Ok(Json(json!({ "character_id": id, "preferences": preferences })))
}

pub async fn save_preferences(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(preferences): Json<JsonValue>,
) -> Result<Json<JsonValue>, ApiError> {
    state.personas.get(&id)?;
    if !preferences.is_object() {
        return Err(ApiError::validation("Preferences must be a JSON object"));
    }
    PreferenceRepository::new(state.db_pool.clone())
        .save(auth.user_id(), &id, &preferences)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Preferences saved" })))
}
