//! Error types for the conversation crate.

use std::fmt;

/// Errors from conversation domain rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A stored role string is not a known role.
    UnknownRole { value: String },
    /// A stored message kind is not a known kind.
    UnknownKind { value: String },
    /// A rating outside 1..=5.
    RatingOutOfRange { rating: i64 },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRole { value } => write!(f, "unknown turn role: {value}"),
            Self::UnknownKind { value } => write!(f, "unknown message kind: {value}"),
            Self::RatingOutOfRange { rating } => {
                write!(f, "rating must be between 1 and 5, got {rating}")
            }
        }
    }
}

impl std::error::Error for ConversationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_error_display() {
        let err = ConversationError::RatingOutOfRange { rating: 9 };
        assert_eq!(err.to_string(), "rating must be between 1 and 5, got 9");
    }
}
