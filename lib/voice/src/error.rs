//! Error types for voice provider calls.

use std::fmt;

/// Errors from the voice provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// No API key is configured.
    MissingCredentials,
    /// The request never produced a response.
    Transport { reason: String },
    /// The request timed out.
    Timeout,
    /// The provider answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body could not be decoded.
    Decode { reason: String },
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "voice provider API key is not configured"),
            Self::Transport { reason } => write!(f, "voice provider request failed: {reason}"),
            Self::Timeout => write!(f, "voice provider request timed out"),
            Self::Status { status, body } => {
                write!(f, "voice provider returned HTTP {status}: {body}")
            }
            Self::Decode { reason } => {
                write!(f, "failed to decode voice provider response: {reason}")
            }
        }
    }
}

impl std::error::Error for VoiceError {}

impl VoiceError {
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport {
                reason: err.to_string(),
            }
        }
    }
}
