//! Analysis clock
//!
//! A run takes a single `as_of` instant when it starts. Account age, history
//! windows, verdict timestamps and the analysis id all derive from it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Source of the `as_of` instant for an analysis run
///
/// # Example
/// ```
/// use check_fraud_core_rs::AnalysisClock;
/// use chrono::{TimeZone, Utc};
///
/// let fixed = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// let clock = AnalysisClock::Fixed(fixed);
/// assert_eq!(clock.now(), fixed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "at", rename_all = "snake_case")]
pub enum AnalysisClock {
    /// Wall clock time
    #[default]
    System,

    /// Frozen instant (tests, replays)
    Fixed(DateTime<Utc>),
}

impl AnalysisClock {
    /// Current instant according to this clock
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            AnalysisClock::System => Utc::now(),
            AnalysisClock::Fixed(at) => *at,
        }
    }

    /// Whether repeated calls return the same instant
    pub fn is_frozen(&self) -> bool {
        matches!(self, AnalysisClock::Fixed(_))
    }
}

/// Longest history or velocity window a rule set or config may ask for
pub const MAX_WINDOW_DAYS: i64 = 36_525;
pub const MAX_WINDOW_HOURS: i64 = MAX_WINDOW_DAYS * 24;

/// Start of a window of `days` ending at `as_of`
///
/// Saturates at the earliest representable instant instead of overflowing.
pub fn days_before(as_of: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|window| as_of.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Start of a window of `hours` ending at `as_of`, saturating like [`days_before`]
pub fn hours_before(as_of: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|window| as_of.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whole days elapsed between `since` and `as_of` (negative if `since` is later)
pub fn days_between(since: DateTime<Utc>, as_of: DateTime<Utc>) -> i64 {
    (as_of - since).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = AnalysisClock::Fixed(at);
        assert!(clock.is_frozen());
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_days_between_truncates() {
        let as_of = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let since = as_of - Duration::hours(47);
        assert_eq!(days_between(since, as_of), 1);
    }

    #[test]
    fn test_window_start_within_range() {
        let as_of = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(days_before(as_of, 9), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(hours_before(as_of, 24), Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_window_start_saturates() {
        let as_of = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(hours_before(as_of, 10_000_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(days_before(as_of, i64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
