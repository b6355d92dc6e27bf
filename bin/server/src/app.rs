//! Router assembly.

use crate::auth::routes as auth;
use crate::routes::{characters, chat, user, ws};
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Largest accepted voice upload.
const VOICE_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Accounts
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/auth/deactivate", delete(auth::deactivate))
        // Personas
        .route("/api/characters", get(characters::list))
        .route("/api/characters/search", get(characters::search))
        .route("/api/characters/categories", get(characters::categories))
        .route("/api/characters/popular", get(characters::popular))
        .route(
            "/api/characters/category/{category}",
            get(characters::by_category),
        )
        .route("/api/characters/{id}", get(characters::get))
        .route("/api/characters/{id}/skills", get(characters::skills))
        .route(
            "/api/characters/{id}/skills/{skill}",
            post(characters::use_skill),
        )
        .route(
            "/api/characters/{id}/favorite",
            post(characters::favorite).delete(characters::unfavorite),
        )
        .route(
            "/api/characters/{id}/favorite-status",
            get(characters::favorite_status),
        )
        .route(
            "/api/characters/{id}/rating",
            post(characters::rate).get(characters::rating),
        )
        .route(
            "/api/characters/{id}/preferences",
            get(characters::preferences).put(characters::save_preferences),
        )
        // Chat
        .route("/api/chat/text", post(chat::text))
        .route(
            "/api/chat/voice",
            post(chat::voice).layer(DefaultBodyLimit::max(VOICE_UPLOAD_LIMIT)),
        )
        .route(
            "/api/chat/history",
            get(chat::all_history).delete(chat::clear_all_history),
        )
        .route(
            "/api/chat/history/{character_id}",
            get(chat::history).delete(chat::clear_history),
        )
        .route("/api/chat/search", get(chat::search))
        // User data
        .route("/api/user/favorites", get(user::favorites))
        .route(
            "/api/user/settings",
            get(user::settings).post(user::save_settings),
        )
        .route("/api/user/settings/{key}", get(user::setting))
        .route("/ws/{character_id}", get(ws::handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{TurnRepository, test_pool};
    use crate::dialogue::FALLBACK_REPLY;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use timetalker_ai::{DashScopeBackend, LlmConfig};
    use timetalker_core::UserId;
    use timetalker_persona::PersonaRegistry;
    use timetalker_platform_access::TokenIssuer;
    use timetalker_voice::{VoiceBridge, VoiceConfig};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        pool: sqlx::SqlitePool,
    }

    /// The real router with no provider credentials, so the model is
    /// unreachable and voice runs degraded.
    async fn test_app() -> TestApp {
        let pool = test_pool().await;
        let llm = DashScopeBackend::new(LlmConfig::default()).expect("client");
        let state = AppState::new(
            pool.clone(),
            Arc::new(PersonaRegistry::builtin()),
            Arc::new(llm),
            VoiceBridge::new(VoiceConfig::default()),
            TokenIssuer::new(b"test-secret", chrono::Duration::hours(1)),
            1_000,
        );
        TestApp {
            router: router(Arc::new(state)),
            pool,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("infallible");
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body");
            let json = if bytes.is_empty() {
                JsonValue::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
            };
            (status, json)
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<JsonValue>,
        ) -> (StatusCode, JsonValue) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            self.send(builder.body(body).expect("request")).await
        }

        async fn register_and_login(&self, username: &str) -> String {
            let (status, _) = self
                .call(
                    "POST",
                    "/api/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "email": format!("{username}@x.com"),
                        "password": "pw123",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            let (status, body) = self
                .call(
                    "POST",
                    "/api/auth/login",
                    None,
                    Some(json!({"username": username, "password": "pw123"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().expect("token").to_string()
        }
    }

    #[tokio::test]
    async fn health_check() {
        let app = test_app().await;
        let (status, body) = app.call("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let app = test_app().await;
        let alice = json!({"username": "alice", "email": "a@x.com", "password": "pw123"});

        let (status, body) = app
            .call("POST", "/api/auth/register", None, Some(alice.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["user_id"].as_str().is_some_and(|id| id.starts_with("usr_")));

        let (status, body) = app
            .call("POST", "/api/auth/register", None, Some(alice))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_then_fetch_profile() {
        let app = test_app().await;
        app.call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({"username": "alice", "email": "a@x.com", "password": "pw123"})),
        )
        .await;

        let (status, _) = app
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "alice", "password": "wrongpw"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "alice", "password": "pw123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        let token = body["token"].as_str().expect("token");

        let (status, body) = app.call("GET", "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert!(body["user"].get("password_hash").is_none());
        assert!(!body["user"]["last_login"].is_null());
    }

    #[tokio::test]
    async fn protected_routes_require_bearer() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .expect("request");
        let response = app.router.clone().oneshot(request).await.expect("infallible");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).map(|v| v.as_bytes()),
            Some(&b"Bearer"[..])
        );

        let (status, _) = app
            .call("GET", "/api/auth/me", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn chat_falls_back_when_model_is_unreachable() {
        let app = test_app().await;
        let token = app.register_and_login("alice").await;

        let (status, body) = app
            .call(
                "POST",
                "/api/chat/text",
                Some(&token),
                Some(json!({"character_id": "socrates", "message": "What is virtue?"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], FALLBACK_REPLY);

        let (status, body) = app
            .call("GET", "/api/chat/history/socrates", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let turns = body.as_array().expect("turns");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0]["role"], "user");
        assert_eq!(turns[0]["content"], "What is virtue?");
        assert_eq!(turns[1]["role"], "assistant");
        assert_eq!(turns[1]["content"], FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn chat_validates_input_and_persona() {
        let app = test_app().await;
        let token = app.register_and_login("bob").await;

        let (status, _) = app
            .call(
                "POST",
                "/api/chat/text",
                Some(&token),
                Some(json!({"character_id": "socrates"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                "POST",
                "/api/chat/text",
                Some(&token),
                Some(json!({"character_id": "gandalf", "message": "hi"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let any_turns = TurnRepository::new(app.pool.clone())
            .history("gandalf", None, 50)
            .await
            .expect("history");
        assert!(any_turns.is_empty());
    }

    #[tokio::test]
    async fn catalog_routes() {
        let app = test_app().await;

        let (status, body) = app.call("GET", "/api/characters", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(5));

        let (_, body) = app
            .call("GET", "/api/characters/search?query=PHILOSOPH", None, None)
            .await;
        assert!(body.as_array().expect("list").iter().any(|p| p["id"] == "socrates"));

        let (status, body) = app.call("GET", "/api/characters/socrates", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Socrates");

        let (status, _) = app.call("GET", "/api/characters/gandalf", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app.call("GET", "/api/characters/categories", None, None).await;
        assert_eq!(body["categories"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn popular_accepts_any_window() {
        let app = test_app().await;
        TurnRepository::new(app.pool.clone())
            .append(&timetalker_conversation::NewTurn::user(
                "einstein",
                None,
                "hello",
                timetalker_conversation::MessageKind::Text,
            ))
            .await
            .expect("append");

        let (status, body) = app
            .call("GET", "/api/characters/popular?days=100000000", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["popular"][0]["character_id"], "einstein");

        let (status, _) = app
            .call("GET", "/api/characters/popular?days=4294967295", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn favorites_flow() {
        let app = test_app().await;
        let token = app.register_and_login("carol").await;

        let (status, body) = app
            .call("POST", "/api/characters/einstein/favorite", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = app
            .call("POST", "/api/characters/einstein/favorite", Some(&token), None)
            .await;
        assert_eq!(body["success"], false);

        let (_, body) = app
            .call("GET", "/api/characters/einstein/favorite-status", Some(&token), None)
            .await;
        assert_eq!(body["is_favorited"], true);

        let (_, body) = app.call("GET", "/api/user/favorites", Some(&token), None).await;
        let favorites = body["favorites"].as_array().expect("favorites");
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0]["id"], "einstein");
        assert_eq!(favorites[0]["is_favorited"], true);

        let (status, _) = app
            .call("POST", "/api/characters/gandalf/favorite", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let app = test_app().await;
        let token = app.register_and_login("dave").await;

        let (status, _) = app
            .call(
                "POST",
                "/api/user/settings",
                Some(&token),
                Some(json!({"theme": "dark", "volume": 7})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        app.call(
            "POST",
            "/api/user/settings",
            Some(&token),
            Some(json!({"theme": "light"})),
        )
        .await;

        let (_, body) = app
            .call("GET", "/api/user/settings/theme", Some(&token), None)
            .await;
        assert_eq!(body["setting_value"], "light");

        let (_, body) = app.call("GET", "/api/user/settings", Some(&token), None).await;
        assert_eq!(body["settings"]["volume"], "7");

        let (status, _) = app
            .call("GET", "/api/user/settings/missing", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn skill_errors_map_to_distinct_statuses() {
        let app = test_app().await;
        let token = app.register_and_login("erin").await;

        let (status, _) = app
            .call(
                "POST",
                "/api/characters/socrates/skills/wise_counsel",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

        let (status, _) = app
            .call(
                "POST",
                "/api/characters/einstein/skills/wise_counsel",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(
                "POST",
                "/api/characters/shakespeare/skills/story_creation",
                Some(&token),
                Some(json!({"topic": "a shipwreck"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skill"], "story_creation");
        assert_eq!(body["result"], FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn change_password_with_wrong_old_password_is_bad_request() {
        let app = test_app().await;
        let token = app.register_and_login("frank").await;

        let (status, _) = app
            .call(
                "POST",
                "/api/auth/change-password",
                Some(&token),
                Some(json!({"old_password": "nope", "new_password": "pw456"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                "POST",
                "/api/auth/change-password",
                Some(&token),
                Some(json!({"old_password": "pw123", "new_password": "pw456"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "frank@x.com", "password": "pw456"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn deactivated_account_cannot_log_in() {
        let app = test_app().await;
        let token = app.register_and_login("grace").await;

        let (status, _) = app
            .call("DELETE", "/api/auth/deactivate", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "grace", "password": "pw123"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn history_is_scoped_to_the_caller() {
        let app = test_app().await;
        let alice = app.register_and_login("alice").await;
        let bob = app.register_and_login("bob").await;

        app.call(
            "POST",
            "/api/chat/text",
            Some(&alice),
            Some(json!({"character_id": "einstein", "message": "Relativity?"})),
        )
        .await;

        let (_, body) = app.call("GET", "/api/chat/history", Some(&bob), None).await;
        assert_eq!(body, json!({}));

        let (_, body) = app
            .call("GET", "/api/chat/search?query=Relativity", Some(&alice), None)
            .await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (_, body) = app
            .call("DELETE", "/api/chat/history", Some(&alice), None)
            .await;
        assert_eq!(body["deleted"], 2);

        let anonymous = TurnRepository::new(app.pool.clone())
            .history("einstein", Some(UserId::new()), 50)
            .await
            .expect("history");
        assert!(anonymous.is_empty());
    }
}
