//! Shared application state.

use crate::config::ServerConfig;
use crate::db::TurnRepository;
use crate::dialogue::Dialogue;
use sqlx::SqlitePool;
use std::sync::Arc;
use timetalker_ai::{DashScopeBackend, LlmBackend, LlmError};
use timetalker_persona::PersonaRegistry;
use timetalker_platform_access::TokenIssuer;
use timetalker_voice::VoiceBridge;

/// State shared by every handler.
pub struct AppState {
    /// Database connection pool.
    pub db_pool: SqlitePool,
    /// The persona catalog, read-only after startup.
    pub personas: Arc<PersonaRegistry>,
    pub dialogue: Dialogue,
    /// Signs and verifies bearer tokens.
    pub tokens: TokenIssuer,
    /// PBKDF2 iterations for new password hashes.
    pub password_iterations: u32,
}

impl AppState {
    /// Creates application state from explicit parts.
    pub fn new(
        db_pool: SqlitePool,
        personas: Arc<PersonaRegistry>,
        llm: Arc<dyn LlmBackend>,
        voice: VoiceBridge,
        tokens: TokenIssuer,
        password_iterations: u32,
    ) -> Self {
        let dialogue = Dialogue::new(
            personas.clone(),
            llm,
            voice,
            TurnRepository::new(db_pool.clone()),
        );
        Self {
            db_pool,
            personas,
            dialogue,
            tokens,
            password_iterations,
        }
    }

    /// Creates application state with the production providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the language model client cannot be built.
    pub fn from_config(db_pool: SqlitePool, config: &ServerConfig) -> Result<Self, LlmError> {
        let llm = DashScopeBackend::new(config.llm.clone())?;
        if !llm.is_configured() {
            tracing::warn!("LLM__API_KEY is not set; chat replies will use the fallback message");
        }
        let voice = VoiceBridge::new(config.voice.clone());
        if !voice.is_configured() {
            tracing::warn!("VOICE__API_KEY is not set; voice features run in degraded mode");
        }
        let tokens = TokenIssuer::new(&config.auth.signing_secret(), config.auth.token_ttl());

        Ok(Self::new(
            db_pool,
            Arc::new(PersonaRegistry::builtin()),
            Arc::new(llm),
            voice,
            tokens,
            config.auth.password_iterations,
        ))
    }
}
