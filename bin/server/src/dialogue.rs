//! Dialogue orchestration.
//!
//! [`Dialogue`] ties one interaction together: resolve the persona, build
//! the prompt, call the model, route audio through the voice bridge and
//! record the turns. Model failures never reach the caller. They are
//! replaced by [`FALLBACK_REPLY`] so every user turn gets an assistant turn.

use crate::db::TurnRepository;
use crate::error::ApiError;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use timetalker_ai::{InteractionKind, LlmBackend, PersonaPrompt, build_prompt};
use timetalker_conversation::{MessageKind, NewTurn};
use timetalker_core::UserId;
use timetalker_persona::{Persona, PersonaError, PersonaRegistry, SkillError};
use timetalker_voice::VoiceBridge;

/// Reply recorded and returned when the language model cannot answer.
pub const FALLBACK_REPLY: &str = "Sorry, I can't respond right now. Please try again later.";

/// Errors from a dialogue operation.
#[derive(Debug)]
pub enum DialogueError {
    /// The persona does not exist.
    PersonaNotFound { persona_id: String },
    /// The skill invocation was rejected.
    Skill { error: SkillError },
    /// Speech recognition produced no text.
    EmptyTranscript,
    /// Recording a turn failed.
    Storage { details: String },
}

impl fmt::Display for DialogueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonaNotFound { persona_id } => write!(f, "persona not found: {}", persona_id),
            Self::Skill { error } => write!(f, "{}", error),
            Self::EmptyTranscript => write!(f, "no speech recognized"),
            Self::Storage { details } => write!(f, "failed to record turn: {}", details),
        }
    }
}

impl std::error::Error for DialogueError {}

impl From<PersonaError> for DialogueError {
    fn from(err: PersonaError) -> Self {
        match err {
            PersonaError::NotFound { id } => Self::PersonaNotFound { persona_id: id },
        }
    }
}

impl From<SkillError> for DialogueError {
    fn from(error: SkillError) -> Self {
        match error {
            SkillError::PersonaNotFound { persona_id } => Self::PersonaNotFound { persona_id },
            error => Self::Skill { error },
        }
    }
}

impl From<sqlx::Error> for DialogueError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage {
            details: err.to_string(),
        }
    }
}

impl From<DialogueError> for ApiError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::PersonaNotFound { .. } => ApiError::not_found("Character not found"),
            DialogueError::Skill { error } => ApiError::from(error),
            DialogueError::EmptyTranscript => ApiError::validation("Could not recognize speech"),
            DialogueError::Storage { details } => ApiError::Internal { details },
        }
    }
}

/// Outcome of one voice exchange.
#[derive(Debug, Clone)]
pub struct VoiceExchange {
    pub transcript: String,
    pub reply: String,
    pub audio: Vec<u8>,
    /// True if either speech step used placeholder output.
    pub degraded: bool,
}

/// Outcome of a skill invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillResult {
    pub skill: String,
    pub result: String,
    /// Display name of the persona.
    pub persona: String,
}

/// Coordinates personas, the model, the voice bridge and the turn log.
pub struct Dialogue {
    personas: Arc<PersonaRegistry>,
    llm: Arc<dyn LlmBackend>,
    voice: VoiceBridge,
    turns: TurnRepository,
}

impl Dialogue {
    pub fn new(
        personas: Arc<PersonaRegistry>,
        llm: Arc<dyn LlmBackend>,
        voice: VoiceBridge,
        turns: TurnRepository,
    ) -> Self {
        Self {
            personas,
            llm,
            voice,
            turns,
        }
    }

    /// Answers a text message.
    ///
    /// The user turn is recorded before the model call and the reply after
    /// it. An unknown persona fails before anything is recorded.
    #[tracing::instrument(skip(self, message))]
    pub async fn chat_text(
        &self,
        persona_id: &str,
        user_id: Option<UserId>,
        message: &str,
    ) -> Result<String, DialogueError> {
        let persona = self.personas.get(persona_id)?;
        self.converse(persona, user_id, message, MessageKind::Text)
            .await
    }

    /// Transcribes a clip, answers it and speaks the answer.
    #[tracing::instrument(skip(self, audio), fields(audio_bytes = audio.len()))]
    pub async fn chat_voice(
        &self,
        persona_id: &str,
        user_id: Option<UserId>,
        audio: &[u8],
    ) -> Result<VoiceExchange, DialogueError> {
        let persona = self.personas.get(persona_id)?;

        let transcription = self.voice.transcribe(audio).await;
        let transcript = transcription.text.trim().to_string();
        if transcript.is_empty() {
            return Err(DialogueError::EmptyTranscript);
        }

        let reply = self
            .converse(persona, user_id, &transcript, MessageKind::Voice)
            .await?;
        let synthesis = self.voice.synthesize(&reply, None).await;

        Ok(VoiceExchange {
            transcript,
            reply,
            audio: synthesis.audio,
            degraded: transcription.degraded || synthesis.degraded,
        })
    }

    /// Runs one of the persona's skills and records the labelled result.
    #[tracing::instrument(skip(self, params))]
    pub async fn use_skill(
        &self,
        persona_id: &str,
        skill_name: &str,
        params: &JsonValue,
        user_id: Option<UserId>,
    ) -> Result<SkillResult, DialogueError> {
        let (persona, spec) = self.personas.resolve_skill(persona_id, skill_name)?;
        let input = spec.extract_input(params);
        let result = self
            .generate(persona, build_prompt(persona, InteractionKind::Skill(spec), &input))
            .await;

        self.turns
            .append(&NewTurn::assistant(
                &persona.id,
                user_id,
                format!("[{}] {}", spec.name, result),
                MessageKind::Skill,
            ))
            .await?;

        Ok(SkillResult {
            skill: spec.name.to_string(),
            result,
            persona: persona.name.clone(),
        })
    }

    async fn converse(
        &self,
        persona: &Persona,
        user_id: Option<UserId>,
        message: &str,
        kind: MessageKind,
    ) -> Result<String, DialogueError> {
        self.turns
            .append(&NewTurn::user(&persona.id, user_id, message, kind))
            .await?;

        let reply = self
            .generate(persona, build_prompt(persona, InteractionKind::Chat, message))
            .await;

        self.turns
            .append(&NewTurn::assistant(&persona.id, user_id, &reply, kind))
            .await?;
        Ok(reply)
    }

    async fn generate(&self, persona: &Persona, prompt: PersonaPrompt) -> String {
        match self.llm.generate(&prompt.into_request()).await {
            Ok(response) => {
                tracing::debug!(
                    persona_id = %persona.id,
                    tokens = response.usage.total(),
                    "model replied"
                );
                response.content
            }
            Err(e) => {
                tracing::warn!(
                    degraded = true,
                    persona_id = %persona.id,
                    model = self.llm.model(),
                    error = %e,
                    "language model unavailable, using fallback reply"
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
