//! Result caps shared by the store and the HTTP layer.

/// Turns returned by a history query when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Most recent turns loaded when listing all of a user's conversations.
pub const ALL_HISTORY_CAP: u32 = 1000;

/// Maximum search hits.
pub const SEARCH_CAP: u32 = 100;

/// Trailing window for popularity ranking.
pub const POPULAR_WINDOW_DAYS: u32 = 7;

/// Personas returned by a popularity query when the caller gives no limit.
pub const DEFAULT_POPULAR_LIMIT: u32 = 10;

/// Resolves a caller-supplied history limit: absent means the default,
/// and the result never exceeds [`ALL_HISTORY_CAP`].
#[must_use]
pub fn history_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(ALL_HISTORY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_limit_defaults_and_caps() {
        assert_eq!(history_limit(None), 50);
        assert_eq!(history_limit(Some(5)), 5);
        assert_eq!(history_limit(Some(5000)), 1000);
        assert_eq!(history_limit(Some(0)), 0);
    }
}
