//! Persona ratings and popularity.

use crate::error::ConversationError;
use serde::Serialize;

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

/// Checks that a rating is within 1..=5.
///
/// # Errors
///
/// Returns `RatingOutOfRange` otherwise.
pub fn validate_rating(rating: i64) -> Result<u8, ConversationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        u8::try_from(rating).map_err(|_| ConversationError::RatingOutOfRange { rating })
    } else {
        Err(ConversationError::RatingOutOfRange { rating })
    }
}

/// Aggregate of every rating a persona has received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Mean rounded to two decimals, 0 when there are no ratings.
    pub average_rating: f64,
    pub total_ratings: u64,
}

impl RatingSummary {
    /// Builds a summary from the raw mean and count.
    #[must_use]
    pub fn new(mean: Option<f64>, count: u64) -> Self {
        let average_rating = match mean {
            Some(mean) if count > 0 => (mean * 100.0).round() / 100.0,
            _ => 0.0,
        };
        Self {
            average_rating,
            total_ratings: count,
        }
    }
}

/// A persona ranked by recent turn count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularPersona {
    #[serde(rename = "character_id")]
    pub persona_id: String,
    pub chat_count: u64,
}
