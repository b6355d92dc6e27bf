//! Streaming chat over a WebSocket.
//!
//! Each text frame from the client is one JSON message tagged by `type`.
//! Failures are reported in-band as `error` frames; the connection is
//! only closed by the server when the persona does not exist.

use crate::db::ChatSessionRepository;
use crate::dialogue::{Dialogue, DialogueError};
use crate::state::AppState;
use axum::{
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timetalker_core::UserId;

/// Close code sent when the requested persona does not exist.
pub const CLOSE_UNKNOWN_PERSONA: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Optional bearer token binding the conversation to a user.
    pub token: Option<String>,
}

/// A frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Text { content: String },
    /// Base64-encoded audio clip.
    Voice { audio: String },
}

/// A frame sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Text {
        content: String,
        timestamp: String,
    },
    VoiceResponse {
        user_text: String,
        response_text: String,
        /// Base64-encoded audio.
        response_audio: String,
        timestamp: String,
    },
    Error {
        content: String,
        timestamp: String,
    },
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

impl ServerFrame {
    fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
            timestamp: now(),
        }
    }
}

/// Upgrades the connection. An invalid token is ignored and the
/// conversation proceeds anonymously.
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Path(character_id): Path<String>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = query
        .token
        .as_deref()
        .and_then(|token| match state.tokens.verify(token) {
            Ok(user) => Some(user.user_id()),
            Err(report) => {
                tracing::debug!(error = %report, "ignoring invalid websocket token");
                None
            }
        });
    ws.on_upgrade(move |socket| serve(socket, state, character_id, user_id))
}

#[tracing::instrument(skip(socket, state))]
async fn serve(
    mut socket: WebSocket,
    state: Arc<AppState>,
    character_id: String,
    user_id: Option<UserId>,
) {
    if !state.personas.contains(&character_id) {
        let close = Message::Close(Some(CloseFrame {
            code: CLOSE_UNKNOWN_PERSONA,
            reason: "Character not found".into(),
        }));
        if let Err(e) = socket.send(close).await {
            tracing::debug!(error = %e, "failed to send close frame");
        }
        return;
    }

    let sessions = ChatSessionRepository::new(state.db_pool.clone());
    let session_id = match sessions.open(&character_id, user_id).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(error = %e, "failed to record chat session");
            None
        }
    };
    tracing::info!(session_id = ?session_id, "websocket connected");

    while let Some(message) = socket.recv().await {
        let raw = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "websocket receive failed");
                break;
            }
        };

        let frame = respond(&state.dialogue, &character_id, user_id, raw.as_str()).await;
        if let Some(id) = session_id {
            if let Err(e) = sessions.touch(id).await {
                tracing::warn!(error = %e, "failed to touch chat session");
            }
        }

        let payload = match serde_json::to_string(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode frame");
                continue;
            }
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }

    tracing::info!(session_id = ?session_id, "websocket disconnected");
}

/// Produces the reply frame for one client frame.
pub async fn respond(
    dialogue: &Dialogue,
    persona_id: &str,
    user_id: Option<UserId>,
    raw: &str,
) -> ServerFrame {
    let frame = match serde_json::from_str::<ClientFrame>(raw) {
        Ok(frame) => frame,
        Err(e) => return ServerFrame::error(format!("Malformed message: {}", e)),
    };

    match frame {
        ClientFrame::Text { content } => {
            if content.trim().is_empty() {
                return ServerFrame::error("Message is empty");
            }
            match dialogue.chat_text(persona_id, user_id, &content).await {
                Ok(reply) => ServerFrame::Text {
                    content: reply,
                    timestamp: now(),
                },
                Err(e) => failure(e),
            }
        }
        ClientFrame::Voice { audio } => {
            let Ok(audio) = STANDARD.decode(audio.as_bytes()) else {
                return ServerFrame::error("Invalid audio encoding");
            };
            match dialogue.chat_voice(persona_id, user_id, &audio).await {
                Ok(exchange) => ServerFrame::VoiceResponse {
                    user_text: exchange.transcript,
                    response_text: exchange.reply,
                    response_audio: STANDARD.encode(&exchange.audio),
                    timestamp: now(),
                },
                Err(e) => failure(e),
            }
        }
    }
}

fn failure(err: DialogueError) -> ServerFrame {
    match err {
        DialogueError::EmptyTranscript => ServerFrame::error("Could not recognize speech"),
        DialogueError::Storage { details } => {
            tracing::error!(error = %details, "websocket turn failed");
            ServerFrame::error("Internal server error")
        }
        other => ServerFrame::error(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{TurnRepository, test_pool};
    use crate::dialogue::FALLBACK_REPLY;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::Value as JsonValue;
    use std::net::SocketAddr;
    use timetalker_ai::{DashScopeBackend, LlmConfig};
    use timetalker_persona::PersonaRegistry;
    use timetalker_platform_access::TokenIssuer;
    use timetalker_voice::{VoiceBridge, VoiceConfig};
    use tokio_tungstenite::{connect_async, tungstenite::Message as ClientMessage};

    async fn offline_dialogue() -> (Dialogue, TurnRepository) {
        let turns = TurnRepository::new(test_pool().await);
        let llm = DashScopeBackend::new(LlmConfig::default()).expect("client");
        let dialogue = Dialogue::new(
            Arc::new(PersonaRegistry::builtin()),
            Arc::new(llm),
            VoiceBridge::new(VoiceConfig::default()),
            turns.clone(),
        );
        (dialogue, turns)
    }

    /// Serves the real router on an ephemeral port.
    async fn spawn_server() -> (SocketAddr, sqlx::SqlitePool) {
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
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, crate::app::router(Arc::new(state)))
                .await
                .expect("serve");
        });
        (addr, pool)
    }

    #[tokio::test]
    async fn unknown_persona_closes_with_code() {
        let (addr, _) = spawn_server().await;
        let (mut socket, _) = connect_async(format!("ws://{addr}/ws/gandalf"))
            .await
            .expect("connect");

        let message = socket.next().await.expect("frame").expect("message");
        let ClientMessage::Close(Some(frame)) = message else {
            panic!("expected close frame, got {message:?}");
        };
        assert_eq!(u16::from(frame.code), CLOSE_UNKNOWN_PERSONA);
    }

    #[tokio::test]
    async fn text_frame_round_trip_over_socket() {
        let (addr, pool) = spawn_server().await;
        let (mut socket, _) = connect_async(format!("ws://{addr}/ws/socrates"))
            .await
            .expect("connect");

        socket
            .send(ClientMessage::Text(
                r#"{"type":"text","content":"What is virtue?"}"#.to_string(),
            ))
            .await
            .expect("send");
        let reply = loop {
            match socket.next().await.expect("frame").expect("message") {
                ClientMessage::Text(text) => break text,
                ClientMessage::Ping(_) | ClientMessage::Pong(_) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        };
        let reply: JsonValue = serde_json::from_str(&reply).expect("json");
        assert_eq!(reply["type"], "text");
        assert_eq!(reply["content"], FALLBACK_REPLY);

        let (sessions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(sessions, 1);
        let turns = TurnRepository::new(pool)
            .history("socrates", None, 50)
            .await
            .expect("history");
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn frames_use_type_tags() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"text","content":"hi"}"#).expect("parse");
        assert_eq!(frame, ClientFrame::Text { content: "hi".to_string() });

        let json = serde_json::to_value(ServerFrame::VoiceResponse {
            user_text: "a".to_string(),
            response_text: "b".to_string(),
            response_audio: "c".to_string(),
            timestamp: "t".to_string(),
        })
        .expect("serialize");
        assert_eq!(json["type"], "voice_response");
    }

    #[tokio::test]
    async fn malformed_frame_yields_error_frame() {
        let (dialogue, _) = offline_dialogue().await;
        let frame = respond(&dialogue, "socrates", None, r#"{"type":"video"}"#).await;
        assert!(matches!(frame, ServerFrame::Error { .. }));
    }

    #[tokio::test]
    async fn text_frame_is_answered_and_recorded() {
        let (dialogue, turns) = offline_dialogue().await;
        let user = UserId::new();

        let frame = respond(
            &dialogue,
            "harry_potter",
            Some(user),
            r#"{"type":"text","content":"Hello Harry"}"#,
        )
        .await;
        let ServerFrame::Text { content, .. } = frame else {
            panic!("expected text frame, got {frame:?}");
        };
        assert_eq!(content, FALLBACK_REPLY);
        assert_eq!(
            turns.history("harry_potter", Some(user), 50).await.expect("history").len(),
            2
        );
    }

    #[tokio::test]
    async fn undecodable_audio_yields_error_frame() {
        let (dialogue, turns) = offline_dialogue().await;
        let frame = respond(&dialogue, "einstein", None, r#"{"type":"voice","audio":"%%%"}"#).await;
        assert!(matches!(frame, ServerFrame::Error { .. }));
        assert!(turns.history("einstein", None, 50).await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn voice_frame_gets_voice_response() {
        let (dialogue, _) = offline_dialogue().await;
        let raw = format!(r#"{{"type":"voice","audio":"{}"}}"#, STANDARD.encode(b"clip"));

        let frame = respond(&dialogue, "einstein", None, &raw).await;
        let ServerFrame::VoiceResponse { user_text, response_audio, .. } = frame else {
            panic!("expected voice response, got {frame:?}");
        };
        assert!(!user_text.is_empty());
        assert!(!response_audio.is_empty());
    }
}
