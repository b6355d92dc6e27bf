//! Core identifiers and error handling for TimeTalker.
//!
//! This crate provides the strongly-typed ids and the rootcause-based
//! `Result` alias shared by every other crate in the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ChatSessionId, ParseIdError, UserId};
