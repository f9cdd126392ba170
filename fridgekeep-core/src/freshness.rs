//! Freshness derivation for ingredients.
//!
//! The state of an active ingredient is a pure function of its expiration
//! date and the current time:
//!
//! ```text
//! diff_days = ceil(expiration - now)     (expiration taken at 00:00 UTC)
//!
//! diff_days < 0       → EXPIRED
//! 0 ..= 3             → NEAR_EXPIRY
//! diff_days > 3       → FRESH
//! ```
//!
//! CONSUMED and DISPOSED are terminal and always win over the date.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::IngredientState;

/// Ingredients this many days from expiry (or fewer) are NEAR_EXPIRY.
pub const NEAR_EXPIRY_DAYS: i64 = 3;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days until `expiration`, rounded up.
///
/// Negative once the expiration day has fully passed; `0` during the
/// expiration day itself.
pub fn days_until(expiration: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expires_at = expiration.and_time(NaiveTime::MIN).and_utc();
    let diff_ms = (expires_at - now).num_milliseconds();
    // ceil(diff / day) for signed values
    -((-diff_ms).div_euclid(MILLIS_PER_DAY))
}

/// Date-derived state for an active ingredient.
pub fn derive_state(expiration: NaiveDate, now: DateTime<Utc>) -> IngredientState {
    match days_until(expiration, now) {
        d if d < 0 => IngredientState::Expired,
        d if d <= NEAR_EXPIRY_DAYS => IngredientState::NearExpiry,
        _ => IngredientState::Fresh,
    }
}

/// Effective state given what was stored: terminal states are kept, anything
/// else is recomputed from the date.
pub fn effective_state(
    stored: IngredientState,
    expiration: NaiveDate,
    now: DateTime<Utc>,
) -> IngredientState {
    if stored.is_terminal() {
        stored
    } else {
        derive_state(expiration, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = noon(2025, 1, 10);
        assert_eq!(days_until(date(2025, 1, 12), now), 2);
        assert_eq!(days_until(date(2025, 1, 11), now), 1);
        assert_eq!(days_until(date(2025, 1, 10), now), 0);
        assert_eq!(days_until(date(2025, 1, 9), now), -1);
        assert_eq!(days_until(date(2025, 1, 5), now), -5);
    }

    #[test]
    fn test_days_until_exact_midnight() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(days_until(date(2025, 1, 10), midnight), 0);
        assert_eq!(days_until(date(2025, 1, 13), midnight), 3);
    }

    #[test]
    fn test_derive_state_boundaries() {
        let now = noon(2025, 1, 10);
        assert_eq!(derive_state(date(2025, 1, 9), now), IngredientState::Expired);
        assert_eq!(derive_state(date(2025, 1, 10), now), IngredientState::NearExpiry);
        assert_eq!(derive_state(date(2025, 1, 13), now), IngredientState::NearExpiry);
        assert_eq!(derive_state(date(2025, 1, 14), now), IngredientState::Fresh);
    }

    #[test]
    fn test_derive_state_is_pure() {
        let expiration = date(2025, 6, 1);
        let start = noon(2025, 5, 1);

        // Same inputs give the same answer regardless of evaluation order.
        let forward: Vec<_> = (0..45)
            .map(|h| derive_state(expiration, start + Duration::hours(h * 17)))
            .collect();
        let backward: Vec<_> = (0..45)
            .rev()
            .map(|h| derive_state(expiration, start + Duration::hours(h * 17)))
            .collect();
        let reversed: Vec<_> = backward.into_iter().rev().collect();
        assert_eq!(forward, reversed);

        // And the result only depends on diff_days.
        for h in 0..45 {
            let now = start + Duration::hours(h * 17);
            let expected = match days_until(expiration, now) {
                d if d < 0 => IngredientState::Expired,
                d if d <= 3 => IngredientState::NearExpiry,
                _ => IngredientState::Fresh,
            };
            assert_eq!(derive_state(expiration, now), expected);
        }
    }

    #[test]
    fn test_effective_state_keeps_terminal() {
        let now = noon(2025, 1, 10);
        let old = date(2024, 12, 1);

        assert_eq!(
            effective_state(IngredientState::Consumed, old, now),
            IngredientState::Consumed
        );
        assert_eq!(
            effective_state(IngredientState::Disposed, old, now),
            IngredientState::Disposed
        );
        assert_eq!(
            effective_state(IngredientState::Fresh, old, now),
            IngredientState::Expired
        );
    }
}
