//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested keys
//! use `__` as the separator, so `LLM__API_KEY` sets `llm.api_key`.
//!
//! See [`LlmConfig`] and [`VoiceConfig`] for the provider settings.

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use timetalker_ai::LlmConfig;
use timetalker_platform_access::DEFAULT_ITERATIONS;
use timetalker_voice::VoiceConfig;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite database URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Language model provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Speech provider configuration.
    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_database_url() -> String {
    "sqlite://chat_database.db".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_url: default_database_url(),
            auth: AuthConfig::default(),
            llm: LlmConfig::default(),
            voice: VoiceConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// Bearer token and password settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// PBKDF2 iteration count for new password hashes.
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
}

/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_HOURS: i64 = 10 * 366 * 24;

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_password_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            token_ttl_hours: default_token_ttl_hours(),
            password_iterations: default_password_iterations(),
        }
    }
}

impl AuthConfig {
    /// Returns the signing secret.
    ///
    /// Without a configured key a random one is generated, so tokens do not
    /// survive a restart.
    pub fn signing_secret(&self) -> Vec<u8> {
        match self.secret_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.as_bytes().to_vec(),
            _ => {
                tracing::warn!(
                    "AUTH__SECRET_KEY is not set; using a random signing key, tokens will not survive a restart"
                );
                let mut secret = vec![0u8; 32];
                OsRng.fill_bytes(&mut secret);
                secret
            }
        }
    }

    /// Returns the token lifetime.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

/// Retention of chat history and idle sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Turns and sessions older than this many days are deleted.
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Interval between cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_history_days() -> u32 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    3600
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Rejects values that would only fail once the server is running.
    fn validated(self) -> Result<Self, config::ConfigError> {
        let ttl = self.auth.token_ttl_hours;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl) {
            return Err(config::ConfigError::Message(format!(
                "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {ttl}"
            )));
        }
        Ok(self)
    }
}
