//! Speech recognition and synthesis for TimeTalker.
//!
//! [`VoiceBridge`] always answers: when the provider is unconfigured or
//! fails, it returns placeholder output flagged as `degraded` and logs a
//! warning, so the voice chat flow never stalls on a provider outage.

pub mod bridge;
pub mod config;
pub mod degraded;
pub mod error;
pub mod provider;

pub use bridge::{Synthesis, Transcription, VoiceBridge};
pub use config::VoiceConfig;
pub use error::VoiceError;
pub use provider::{QiniuVoiceClient, VoiceProfile};
