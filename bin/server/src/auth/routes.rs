//! Account routes: registration, login and profile management.

use super::{RequireAuth, db::UserRepository};
use crate::db::is_unique_violation;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use timetalker_platform_access::{User, hash_password, verify_password};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/login`. `username` may also be an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `PUT /api/auth/profile`.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Body of `POST /api/auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

fn require_field(value: &str, name: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", name)));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), ApiError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::validation("Invalid email address")),
    }
}

/// Hashes on the blocking pool; PBKDF2 is too slow for a runtime worker.
async fn hash_off_runtime(password: String, iterations: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {}", e)))
}

async fn verify_off_runtime(password: String, encoded: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| ApiError::internal(format!("password check task failed: {}", e)))
}

/// Creates an account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    require_field(&request.username, "username")?;
    require_field(&request.email, "email")?;
    require_field(&request.password, "password")?;
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();
    check_email(&email)?;

    let repo = UserRepository::new(state.db_pool.clone());
    if repo.identity_taken(&username, &email, None).await? {
        return Err(ApiError::conflict("Username or email already exists"));
    }

    let password_hash = hash_off_runtime(request.password, state.password_iterations).await?;
    let user = User::new(username, email, password_hash);
    if let Err(e) = repo.create(&user).await {
        if is_unique_violation(&e) {
            return Err(ApiError::conflict("Username or email already exists"));
        }
        return Err(e.into());
    }

    tracing::info!(user_id = %user.id(), username = %user.username(), "registered user");
    Ok(Json(json!({
        "success": true,
        "message": "Registration successful",
        "user_id": user.id(),
    })))
}

/// Exchanges credentials for a bearer token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    let repo = UserRepository::new(state.db_pool.clone());
    let Some(mut user) = repo.find_by_login(request.username.trim()).await? else {
        return Err(ApiError::unauthorized("Invalid username or password"));
    };
    if !verify_off_runtime(request.password, user.password_hash().to_string()).await? {
        tracing::info!(user_id = %user.id(), "login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }
    if !user.is_active() {
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    let now = Utc::now();
    repo.record_login(user.id(), now).await?;
    user.record_login(now);

    let issued = state
        .tokens
        .issue(user.id(), user.username())
        .map_err(ApiError::internal)?;

    tracing::info!(user_id = %user.id(), "user logged in");
    Ok(Json(json!({
        "success": true,
        "token": issued.token,
        "token_type": "bearer",
        "expires_at": issued.expires_at,
        "user": user,
    })))
}

/// Returns the caller's profile.
pub async fn me(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<JsonValue>, ApiError> {
    let user = UserRepository::new(state.db_pool.clone())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// Updates username, email or avatar.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<JsonValue>, ApiError> {
    if update.username.is_none() && update.email.is_none() && update.avatar_url.is_none() {
        return Err(ApiError::validation("No fields to update"));
    }

    let repo = UserRepository::new(state.db_pool.clone());
    let mut user = repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(username) = update.username {
        require_field(&username, "username")?;
        user.set_username(username.trim().to_string());
    }
    if let Some(email) = update.email {
        check_email(email.trim())?;
        user.set_email(email.trim().to_string());
    }
    if let Some(avatar_url) = update.avatar_url {
        user.set_avatar_url(Some(avatar_url).filter(|url| !url.trim().is_empty()));
    }

    if repo
        .identity_taken(user.username(), user.email(), Some(user.id()))
        .await?
    {
        return Err(ApiError::conflict("Username or email already exists"));
    }
    if let Err(e) = repo.update_profile(&user).await {
        if is_unique_violation(&e) {
            return Err(ApiError::conflict("Username or email already exists"));
        }
        return Err(e.into());
    }

    Ok(Json(json!({ "success": true, "user": user })))
}

/// Replaces the caller's password after checking the old one.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<JsonValue>, ApiError> {
    require_field(&request.new_password, "new_password")?;

    let repo = UserRepository::new(state.db_pool.clone());
    let mut user = repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_off_runtime(request.old_password, user.password_hash().to_string()).await? {
        return Err(ApiError::validation("Old password is incorrect"));
    }

    user.set_password_hash(
        hash_off_runtime(request.new_password, state.password_iterations).await?,
    );
    repo.update_password(user.id(), user.password_hash()).await?;

    tracing::info!(user_id = %user.id(), "password changed");
    Ok(Json(json!({ "success": true, "message": "Password changed" })))
}

/// Soft-deletes the caller's account.
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<JsonValue>, ApiError> {
    let deactivated = UserRepository::new(state.db_pool.clone())
        .deactivate(auth.user_id())
        .await?;
    if !deactivated {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %auth.user_id(), "account deactivated");
    Ok(Json(json!({ "success": true, "message": "Account deactivated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_both_parts() {
        assert!(check_email("a@x.com").is_ok());
        assert!(check_email("ax.com").is_err());
        assert!(check_email("@x.com").is_err());
        assert!(check_email("a@").is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require_field("  ", "username").is_err());
        assert!(require_field("alice", "username").is_ok());
    }

    #[tokio::test]
    async fn password_work_runs_on_blocking_pool() {
        let encoded = hash_off_runtime("pw123".to_string(), 1_000)
            .await
            .expect("hash");
        assert!(
            verify_off_runtime("pw123".to_string(), encoded.clone())
                .await
                .expect("verify")
        );
        assert!(
            !verify_off_runtime("wrong".to_string(), encoded)
                .await
                .expect("verify")
        );
    }
}
