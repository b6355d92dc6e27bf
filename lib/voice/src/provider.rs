//! HTTP client for the Qiniu voice API.

use crate::config::VoiceConfig;
use crate::error::VoiceError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use timetalker_core::Result;

/// One entry of the provider's voice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    #[serde(default)]
    pub voice_type: String,
    #[serde(default)]
    pub voice_name: Option<String>,
}

/// Thin client over `/voice/asr`, `/voice/tts` and `/voice/list`.
///
/// Every method fails with `MissingCredentials` before touching the
/// network when no key is configured.
#[derive(Debug, Clone)]
pub struct QiniuVoiceClient {
    config: VoiceConfig,
    client: reqwest::Client,
}

impl QiniuVoiceClient {
    #[must_use]
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    /// Sends audio for recognition and returns the recognized text.
    ///
    /// # Errors
    ///
    /// Returns an error on missing credentials, transport failure, a
    /// non-success status or an undecodable body.
    #[tracing::instrument(skip_all, fields(bytes = audio.len()))]
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError> {
        let body = self.asr_body(audio);
        let response = self
            .post("voice/asr", &body, self.config.asr_timeout())
            .await?;
        Ok(extract_transcript(&response).unwrap_or_default())
    }

    /// Synthesizes `text` with the given voice and returns encoded audio.
    ///
    /// # Errors
    ///
    /// Returns an error on missing credentials, transport failure, a
    /// non-success status, or a body without decodable audio.
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn synthesize(&self, text: &str, voice_type: &str) -> Result<Vec<u8>, VoiceError> {
        let body = self.tts_body(text, voice_type);
        let response = self
            .post("voice/tts", &body, self.config.tts_timeout())
            .await?;
        let encoded = response
            .get("data")
            .and_then(JsonValue::as_str)
            .filter(|data| !data.is_empty())
            .ok_or_else(|| VoiceError::Decode {
                reason: "response carries no audio data".to_string(),
            })?;
        let audio = STANDARD.decode(encoded).map_err(|e| VoiceError::Decode {
            reason: e.to_string(),
        })?;
        Ok(audio)
    }

    /// Lists the voices offered by the provider.
    ///
    /// # Errors
    ///
    /// Returns an error on missing credentials, transport failure, a
    /// non-success status or an unexpected body shape.
    pub async fn list_voices(&self) -> Result<Vec<VoiceProfile>, VoiceError> {
        let api_key = self.config.api_key().ok_or(VoiceError::MissingCredentials)?;
        let response = self
            .client
            .get(self.config.endpoint("voice/list"))
            .bearer_auth(api_key)
            .timeout(self.config.asr_timeout())
            .send()
            .await
            .map_err(|e| VoiceError::from_reqwest(&e))?;
        let value = read_json(response).await?;
        let voices = serde_json::from_value(value).map_err(|e| VoiceError::Decode {
            reason: e.to_string(),
        })?;
        Ok(voices)
    }

    fn asr_body(&self, audio: &[u8]) -> JsonValue {
        json!({
            "model": self.config.asr_model,
            "audio": {
                "format": self.config.audio_format,
                "data": STANDARD.encode(audio),
            }
        })
    }

    fn tts_body(&self, text: &str, voice_type: &str) -> JsonValue {
        json!({
            "audio": {
                "voice_type": voice_type,
                "encoding": self.config.audio_format,
                "speed_ratio": 1.0,
                "volume": 1.0,
            },
            "request": {
                "text": text,
                "language": self.config.language,
            }
        })
    }

    async fn post(
        &self,
        path: &str,
        body: &JsonValue,
        timeout: Duration,
    ) -> Result<JsonValue, VoiceError> {
        let api_key = self.config.api_key().ok_or(VoiceError::MissingCredentials)?;
        let response = self
            .client
            .post(self.config.endpoint(path))
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| VoiceError::from_reqwest(&e))?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<JsonValue, VoiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VoiceError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    let value = response.json().await.map_err(|e| VoiceError::Decode {
        reason: e.to_string(),
    })?;
    Ok(value)
}

/// Reads the recognized text, trying `data.result.text`, then `text`,
/// then `result`.
#[must_use]
pub fn extract_transcript(response: &JsonValue) -> Option<String> {
    response
        .pointer("/data/result/text")
        .or_else(|| response.get("text"))
        .or_else(|| response.get("result"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

/// Picks the first voice whose type contains `preference`, else the
/// first voice listed.
#[must_use]
pub fn pick_voice(voices: &[VoiceProfile], preference: &str) -> Option<String> {
    voices
        .iter()
        .find(|v| v.voice_type.contains(preference))
        .or_else(|| voices.first())
        .map(|v| v.voice_type.clone())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_prefers_nested_result() {
        let response = json!({"data": {"result": {"text": "nested"}}, "text": "flat"});
        assert_eq!(extract_transcript(&response).as_deref(), Some("nested"));
    }

    #[test]
    fn transcript_falls_back_to_text_then_result() {
        assert_eq!(
            extract_transcript(&json!({"text": "flat"})).as_deref(),
            Some("flat")
        );
        assert_eq!(
            extract_transcript(&json!({"result": "bare"})).as_deref(),
            Some("bare")
        );
        assert_eq!(extract_transcript(&json!({"other": 1})), None);
    }

    #[test]
    fn pick_voice_prefers_tag() {
        let voices = vec![
            VoiceProfile {
                voice_type: "qiniu_en_male".to_string(),
                voice_name: None,
            },
            VoiceProfile {
                voice_type: "qiniu_zh_female".to_string(),
                voice_name: None,
            },
        ];
        assert_eq!(pick_voice(&voices, "zh").as_deref(), Some("qiniu_zh_female"));
        assert_eq!(pick_voice(&voices, "fr").as_deref(), Some("qiniu_en_male"));
        assert_eq!(pick_voice(&[], "zh"), None);
    }

    #[test]
    fn asr_body_inlines_base64_audio() {
        let client = QiniuVoiceClient::new(VoiceConfig::default());
        let body = client.asr_body(b"abc");
        assert_eq!(body["audio"]["data"], "YWJj");
        assert_eq!(body["audio"]["format"], "mp3");
        assert_eq!(body["model"], "asr");
    }

    #[test]
    fn tts_body_carries_voice_and_language() {
        let client = QiniuVoiceClient::new(VoiceConfig::default());
        let body = client.tts_body("hi", "qiniu_zh_female_tmjxxy");
        assert_eq!(body["audio"]["voice_type"], "qiniu_zh_female_tmjxxy");
        assert_eq!(body["request"]["language"], "zh-CN");
        assert_eq!(body["request"]["text"], "hi");
    }

    #[tokio::test]
    async fn calls_without_key_fail_fast() {
        let client = QiniuVoiceClient::new(VoiceConfig::default());
        assert!(client.transcribe(b"abc").await.is_err());
        assert!(client.synthesize("hi", "v").await.is_err());
        assert!(client.list_voices().await.is_err());
    }
}
