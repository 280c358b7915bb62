//! # Primitives
//!
//! Hardcoded constants for the SteamGraph CORE: property names of the Game
//! entity, ingestion defaults and query bounds.

// =============================================================================
// GAME PROPERTY NAMES
// =============================================================================

pub const PROP_NAME: &str = "name";
pub const PROP_RELEASE_DATE: &str = "release_date";
pub const PROP_ESTIMATED_OWNERS: &str = "estimated_owners";
pub const PROP_REQUIRED_AGE: &str = "required_age";
pub const PROP_PRICE: &str = "price";

// =============================================================================
// INGESTION
// =============================================================================

/// Default ceiling on the number of games kept after ranking by owners.
pub const DEFAULT_MAX_ROWS: usize = 500;

/// A progress line is emitted every this many ingested records.
pub const PROGRESS_BATCH_SIZE: usize = 50;

/// Separator of multi-value fields (Publishers, Genres, Tags).
pub const LIST_SEPARATOR: char = ',';

// =============================================================================
// QUERY BOUNDS
// =============================================================================

/// Number of entries returned by the similar-games query.
pub const SIMILAR_GAMES_LIMIT: usize = 10;

/// Upper bound applied to every caller-supplied `limit`.
///
/// Larger values are clamped, not rejected.
pub const MAX_QUERY_LIMIT: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_limit_is_ten() {
        assert_eq!(SIMILAR_GAMES_LIMIT, 10);
    }

    #[test]
    fn default_ceiling_within_query_bound() {
        assert!(DEFAULT_MAX_ROWS <= MAX_QUERY_LIMIT);
        assert!(PROGRESS_BATCH_SIZE > 0);
    }
}
