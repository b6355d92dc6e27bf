//! Outcomes of favorite toggles.
//!
//! Both operations are idempotent; the outcome tells the caller whether
//! anything changed.

use serde::Serialize;

/// Result of favoriting a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteOutcome {
    Added,
    AlreadyFavorited,
}

/// Result of unfavoriting a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfavoriteOutcome {
    Removed,
    NotFavorited,
}

impl FavoriteOutcome {
    /// True if this call created the favorite.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Added)
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "Added to favorites",
            Self::AlreadyFavorited => "Character is already in favorites",
        }
    }
}

impl UnfavoriteOutcome {
    /// True if this call removed the favorite.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Removed)
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Removed => "Removed from favorites",
            Self::NotFavorited => "Character is not in favorites",
        }
    }
}

impl From<bool> for FavoriteOutcome {
    /// Maps "a row was inserted" to an outcome.
    fn from(inserted: bool) -> Self {
        if inserted {
            Self::Added
        } else {
            Self::AlreadyFavorited
        }
    }
}

impl From<bool> for UnfavoriteOutcome {
    /// Maps "a row was deleted" to an outcome.
    fn from(deleted: bool) -> Self {
        if deleted {
            Self::Removed
        } else {
            Self::NotFavorited
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_from_row_counts() {
        assert_eq!(FavoriteOutcome::from(true), FavoriteOutcome::Added);
        assert_eq!(FavoriteOutcome::from(false), FavoriteOutcome::AlreadyFavorited);
        assert_eq!(UnfavoriteOutcome::from(false), UnfavoriteOutcome::NotFavorited);
        assert!(UnfavoriteOutcome::Removed.changed());
        assert!(!FavoriteOutcome::AlreadyFavorited.changed());
    }
}
