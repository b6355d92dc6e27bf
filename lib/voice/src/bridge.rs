//! The always-answering voice bridge.

use crate::config::VoiceConfig;
use crate::degraded;
use crate::provider::{self, QiniuVoiceClient};
use tokio::sync::OnceCell;

/// Result of a transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    pub text: String,
    /// True if `text` is a placeholder rather than provider output.
    pub degraded: bool,
}

/// Result of a synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub audio: Vec<u8>,
    /// True if `audio` is placeholder audio.
    pub degraded: bool,
}

/// Speech-to-text and text-to-speech with a degraded fallback.
///
/// The discovered voice profile is resolved once per bridge and reused.
#[derive(Debug)]
pub struct VoiceBridge {
    client: QiniuVoiceClient,
    voice: OnceCell<String>,
}

impl VoiceBridge {
    #[must_use]
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            client: QiniuVoiceClient::new(config),
            voice: OnceCell::new(),
        }
    }

    /// Returns true if provider credentials are configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client.config().api_key().is_some()
    }

    /// Transcribes audio. Never fails: provider problems yield a mock
    /// phrase with `degraded` set.
    pub async fn transcribe(&self, audio: &[u8]) -> Transcription {
        match self.client.transcribe(audio).await {
            Ok(text) => Transcription {
                text,
                degraded: false,
            },
            Err(report) => {
                let text = degraded::mock_transcript().to_string();
                tracing::warn!(
                    degraded = true,
                    error = %report,
                    transcript = %text,
                    "transcription unavailable, using placeholder"
                );
                Transcription {
                    text,
                    degraded: true,
                }
            }
        }
    }

    /// Synthesizes speech. Never fails: provider problems yield a silent
    /// MP3 frame with `degraded` set.
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Synthesis {
        if !self.is_configured() {
            tracing::warn!(degraded = true, "no voice credentials, using placeholder audio");
            return Synthesis {
                audio: degraded::silent_audio(),
                degraded: true,
            };
        }

        let voice = match voice {
            Some(voice) => voice.to_string(),
            None => self.default_voice().await.to_string(),
        };
        match self.client.synthesize(text, &voice).await {
            Ok(audio) => Synthesis {
                audio,
                degraded: false,
            },
            Err(report) => {
                tracing::warn!(
                    degraded = true,
                    error = %report,
                    voice = %voice,
                    "synthesis unavailable, using placeholder audio"
                );
                Synthesis {
                    audio: degraded::silent_audio(),
                    degraded: true,
                }
            }
        }
    }

    /// Returns the voice used when the caller names none, discovering it
    /// on first use.
    pub async fn default_voice(&self) -> &str {
        self.voice
            .get_or_init(|| async {
                let config = self.client.config();
                match self.client.list_voices().await {
                    Ok(voices) => provider::pick_voice(&voices, &config.voice_preference)
                        .unwrap_or_else(|| config.default_voice.clone()),
                    Err(report) => {
                        tracing::debug!(error = %report, "voice discovery failed, using default");
                        config.default_voice.clone()
                    }
                }
            })
            .await
    }
}
