//! Shared numeric helpers for the bank simulation

use chrono::{DateTime, Utc};

/// Round a price or currency amount to 2 decimal places
///
/// All persisted prices and balances carry at most cent precision.
///
/// # Examples
///
/// ```
/// use bank_sim::helpers::round2;
///
/// assert_eq!(round2(12.345678), 12.35);
/// assert_eq!(round2(99.994), 99.99);
/// assert_eq!(round2(100.0), 100.0);
/// ```
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole minutes elapsed between two timestamps, clamped at zero
///
/// Partial minutes are discarded, matching the wall-clock granularity of
/// the accrual formulas.
///
/// # Examples
///
/// ```
/// use bank_sim::helpers::minutes_between;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
/// assert_eq!(minutes_between(start, start + Duration::seconds(150)), 2);
/// assert_eq!(minutes_between(start + Duration::seconds(150), start), 0);
/// ```
pub fn minutes_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    ((later - earlier).num_milliseconds() / 60_000).max(0)
}
