//! Voice provider configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the Qiniu voice API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// API key. Without one the bridge runs in degraded mode.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Voice used when discovery finds nothing.
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Substring that marks a preferred voice during discovery.
    #[serde(default = "default_voice_preference")]
    pub voice_preference: String,
    /// Synthesis language.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_asr_model")]
    pub asr_model: String,
    /// Audio container for both directions.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[serde(default = "default_asr_timeout_secs")]
    pub asr_timeout_secs: u64,
    #[serde(default = "default_tts_timeout_secs")]
    pub tts_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://openai.qiniu.com/v1".to_string()
}

fn default_voice() -> String {
    "qiniu_zh_female_tmjxxy".to_string()
}

fn default_voice_preference() -> String {
    "zh".to_string()
}

fn default_language() -> String {
    "zh-CN".to_string()
}

fn default_asr_model() -> String {
    "asr".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_asr_timeout_secs() -> u64 {
    30
}

fn default_tts_timeout_secs() -> u64 {
    60
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_voice: default_voice(),
            voice_preference: default_voice_preference(),
            language: default_language(),
            asr_model: default_asr_model(),
            audio_format: default_audio_format(),
            asr_timeout_secs: default_asr_timeout_secs(),
            tts_timeout_secs: default_tts_timeout_secs(),
        }
    }
}

impl VoiceConfig {
    /// Returns the API key, treating a blank key as absent.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    #[must_use]
    pub fn asr_timeout(&self) -> Duration {
        Duration::from_secs(self.asr_timeout_secs)
    }

    #[must_use]
    pub fn tts_timeout(&self) -> Duration {
        Duration::from_secs(self.tts_timeout_secs)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}
