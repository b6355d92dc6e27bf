//! Chat turns.

use crate::error::ConversationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use timetalker_core::UserId;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// The channel a turn came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Voice,
    Skill,
}

impl TurnRole {
    /// Storage encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl MessageKind {
    /// Storage encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Skill => "skill",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnRole {
    type Err = ConversationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(ConversationError::UnknownRole {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for MessageKind {
    type Err = ConversationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            "skill" => Ok(Self::Skill),
            other => Err(ConversationError::UnknownKind {
                value: other.to_string(),
            }),
        }
    }
}

/// A turn about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTurn {
    pub persona_id: String,
    /// `None` for anonymous conversations.
    pub user_id: Option<UserId>,
    pub role: TurnRole,
    pub content: String,
    pub kind: MessageKind,
}

impl NewTurn {
    #[must_use]
    pub fn user(
        persona_id: impl Into<String>,
        user_id: Option<UserId>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            persona_id: persona_id.into(),
            user_id,
            role: TurnRole::User,
            content: content.into(),
            kind,
        }
    }

    #[must_use]
    pub fn assistant(
        persona_id: impl Into<String>,
        user_id: Option<UserId>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            persona_id: persona_id.into(),
            user_id,
            role: TurnRole::Assistant,
            content: content.into(),
            kind,
        }
    }
}

/// A stored turn. Turns are never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Store-assigned sequence number; breaks timestamp ties.
    pub id: i64,
    #[serde(rename = "character_id")]
    pub persona_id: String,
    pub user_id: Option<UserId>,
    pub role: TurnRole,
    pub content: String,
    #[serde(rename = "message_type")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

/// Groups turns by persona, each group oldest-first regardless of input
/// order.
#[must_use]
pub fn group_by_persona(turns: Vec<Turn>) -> BTreeMap<String, Vec<Turn>> {
    let mut groups: BTreeMap<String, Vec<Turn>> = BTreeMap::new();
    for turn in turns {
        groups.entry(turn.persona_id.clone()).or_default().push(turn);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|turn| (turn.timestamp, turn.id));
    }
    groups
}
