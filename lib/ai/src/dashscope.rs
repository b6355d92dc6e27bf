//! DashScope (Qwen) text-generation backend.

use crate::backend::{LlmBackend, LlmMessage, LlmRequest, LlmResponse, TokenUsage};
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "dashscope";

/// Connection settings for the DashScope backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key. Without one every call fails with `InvalidConfig`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation".to_string()
}

fn default_model() -> String {
    "qwen-max".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.8
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: GenerationInput,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationInput {
    messages: Vec<LlmMessage>,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    output: Option<GenerationOutput>,
    #[serde(default)]
    usage: Option<GenerationUsage>,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerationUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Calls the DashScope text-generation endpoint.
pub struct DashScopeBackend {
    config: LlmConfig,
    client: reqwest::Client,
}

impl DashScopeBackend {
    /// Creates a backend with a client bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    /// Returns true if an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    fn body<'a>(&'a self, request: &LlmRequest) -> GenerationRequest<'a> {
        GenerationRequest {
            model: &self.config.model,
            input: GenerationInput {
                messages: request.messages(),
            },
            parameters: GenerationParameters {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                top_p: self.config.top_p,
                max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            },
        }
    }
}

fn transport_error(err: &reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else if err.is_connect() {
        LlmError::ProviderUnavailable {
            provider: PROVIDER.to_string(),
            reason: err.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            reason: err.to_string(),
        }
    }
}

fn parse_reply(response: GenerationResponse, model: &str) -> Result<LlmResponse, LlmError> {
    let content = response
        .output
        .and_then(|output| output.text)
        .ok_or_else(|| LlmError::ResponseParseFailed {
            reason: "missing output.text".to_string(),
        })?;
    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();
    Ok(LlmResponse {
        content,
        usage,
        model: model.to_string(),
    })
}

#[async_trait]
impl LlmBackend for DashScopeBackend {
    #[tracing::instrument(skip(self, request), fields(model = %self.config.model))]
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key().ok_or_else(|| LlmError::InvalidConfig {
            reason: "no API key configured".to_string(),
        })?;

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let body: GenerationResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;
        let reply = parse_reply(body, &self.config.model)?;
        tracing::debug!(
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "generation completed"
        );
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "qwen-max");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_tokens, 1000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: LlmConfig =
            serde_json::from_value(json!({"model": "qwen-plus"})).expect("deserialize");
        assert_eq!(config.model, "qwen-plus");
        assert!((config.top_p - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let backend = DashScopeBackend::new(LlmConfig {
            base_url: "http://127.0.0.1:1/unreachable".to_string(),
            ..LlmConfig::default()
        })
        .expect("client builds");
        assert!(!backend.is_configured());

        let err = backend
            .generate(&LlmRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidConfig { .. }));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let backend = DashScopeBackend::new(LlmConfig {
            api_key: Some("   ".to_string()),
            ..LlmConfig::default()
        })
        .expect("client builds");
        assert!(!backend.is_configured());
    }

    #[test]
    fn request_body_shape() {
        let backend = DashScopeBackend::new(LlmConfig::default()).expect("client builds");
        let request = LlmRequest::new("What is virtue?").with_system("You are Socrates.");
        let body = serde_json::to_value(backend.body(&request)).expect("serialize");

        assert_eq!(body["model"], "qwen-max");
        assert_eq!(body["input"]["messages"][0]["role"], "system");
        assert_eq!(body["input"]["messages"][1]["content"], "What is virtue?");
        assert_eq!(body["parameters"]["max_tokens"], 1000);
    }

    #[test]
    fn request_overrides_temperature() {
        let backend = DashScopeBackend::new(LlmConfig::default()).expect("client builds");
        let body = serde_json::to_value(backend.body(&LlmRequest::new("x").with_temperature(0.5)))
            .expect("serialize");
        assert_eq!(body["parameters"]["temperature"], 0.5);
    }

    #[test]
    fn parse_reply_reads_output_text() {
        let response: GenerationResponse = serde_json::from_value(json!({
            "output": {"text": "Know thyself."},
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }))
        .expect("deserialize");
        let reply = parse_reply(response, "qwen-max").expect("parses");
        assert_eq!(reply.content, "Know thyself.");
        assert_eq!(reply.usage.total(), 15);
    }

    #[test]
    fn parse_reply_without_text_fails() {
        let response: GenerationResponse =
            serde_json::from_value(json!({"output": {}})).expect("deserialize");
        let err = parse_reply(response, "qwen-max").unwrap_err();
        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }
}
