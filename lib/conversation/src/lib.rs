//! Conversation domain types for TimeTalker.
//!
//! Storage lives in the server; this crate defines what is stored (turns,
//! favorites, ratings, popularity rows) and the rules that do not depend
//! on a database: role and kind encodings, rating bounds, result caps and
//! per-persona grouping.

pub mod error;
pub mod favorite;
pub mod limits;
pub mod message;
pub mod rating;

pub use error::ConversationError;
pub use favorite::{FavoriteOutcome, UnfavoriteOutcome};
pub use message::{MessageKind, NewTurn, Turn, TurnRole, group_by_persona};
pub use rating::{PopularPersona, RatingSummary, validate_rating};
