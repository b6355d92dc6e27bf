//! Language model access for TimeTalker.
//!
//! - [`prompt`]: turns a persona and an interaction kind into a prompt
//! - [`backend`]: the provider-neutral [`LlmBackend`] trait
//! - [`dashscope`]: the Qwen backend used in production

pub mod backend;
pub mod dashscope;
pub mod error;
pub mod prompt;

pub use backend::{LlmBackend, LlmMessage, LlmRequest, LlmResponse, MessageRole, TokenUsage};
pub use dashscope::{DashScopeBackend, LlmConfig};
pub use error::LlmError;
pub use prompt::{InteractionKind, PersonaPrompt, build_prompt};
