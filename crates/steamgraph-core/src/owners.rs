//! # Ownership Estimator
//!
//! Turns the free-text "Estimated owners" column (`"0 - 20000"`,
//! `"50000000 - 100000000"`, occasionally a bare number) into a single
//! sortable integer.

use regex::Regex;
use std::sync::LazyLock;

static OWNER_RANGE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").ok());

/// Estimate the number of owners from the dataset's range text.
///
/// - `"<lower> - <upper>"` yields `upper`
/// - otherwise the whole (trimmed) text parsed as an integer
/// - otherwise `0`
///
/// Never fails. A range whose upper bound overflows `u64` falls through to
/// the whole-text parse, which also fails, yielding `0`.
#[must_use]
pub fn estimate_owners(text: &str) -> u64 {
    let range_upper = OWNER_RANGE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(2))
        .and_then(|upper| upper.as_str().parse::<u64>().ok());

    range_upper
        .or_else(|| text.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_yields_upper_bound() {
        assert_eq!(estimate_owners("0 - 20000"), 20000);
        assert_eq!(estimate_owners("50000000 - 100000000"), 100_000_000);
    }

    #[test]
    fn whitespace_around_dash_is_optional() {
        assert_eq!(estimate_owners("20000-50000"), 50000);
        assert_eq!(estimate_owners("  100 -   200  "), 200);
    }

    #[test]
    fn bare_integer_is_parsed() {
        assert_eq!(estimate_owners("12345"), 12345);
        assert_eq!(estimate_owners(" 42 "), 42);
    }

    #[test]
    fn garbage_yields_zero() {
        assert_eq!(estimate_owners(""), 0);
        assert_eq!(estimate_owners("N/A"), 0);
        assert_eq!(estimate_owners("lots"), 0);
        assert_eq!(estimate_owners("-5"), 0);
    }

    #[test]
    fn overflowing_upper_bound_yields_zero() {
        assert_eq!(estimate_owners("0 - 99999999999999999999999"), 0);
    }
}
