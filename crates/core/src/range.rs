//! Query date range value object.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A half-open range of calendar days: `[start, end)`.
///
/// Half-open boundaries make sub-range aggregation exact: `[a, b)` plus
/// `[b, c)` covers `[a, c)` with no shared day, so attribution totals add up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a validated range. Rejects `end <= start` (empty or inverted).
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end <= start {
            return Err(DomainError::invalid_range(format!(
                "end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `count` days ending at `end` (exclusive), e.g. the trailing window
    /// a dashboard asks for.
    pub fn trailing_days(end: NaiveDate, count: u32) -> DomainResult<Self> {
        if count == 0 {
            return Err(DomainError::invalid_range("zero-length range"));
        }
        Self::new(end - Duration::days(i64::from(count)), end)
    }

    /// The single-day range covering `date`. Infallible: one day is never
    /// empty or inverted.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date + Duration::days(1),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Iterate the calendar days covered by this range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d < self.end)
    }

    /// The immediately preceding range of identical length.
    ///
    /// `previous.end == self.start`, so the two windows are adjacent and
    /// never misaligned or unequal in length.
    pub fn previous(&self) -> Self {
        let len = Duration::days(self.len_days());
        Self {
            start: self.start - len,
            end: self.start,
        }
    }

    /// Inclusive timestamp lower bound (midnight of `start`, UTC).
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc()
    }

    /// Exclusive timestamp upper bound (midnight of `end`, UTC).
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.end.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc()
    }
}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(d("2026-03-10"), d("2026-03-01")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange(_)));
    }

    #[test]
    fn rejects_zero_length_range() {
        let err = DateRange::new(d("2026-03-10"), d("2026-03-10")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange(_)));
    }

    #[test]
    fn days_are_ascending_and_exclusive_of_end() {
        let range = DateRange::new(d("2026-03-01"), d("2026-03-04")).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![d("2026-03-01"), d("2026-03-02"), d("2026-03-03")]);
    }

    #[test]
    fn previous_period_is_adjacent_and_equal_length() {
        let range = DateRange::new(d("2026-03-11"), d("2026-03-21")).unwrap();
        let prev = range.previous();
        assert_eq!(prev.end(), range.start());
        assert_eq!(prev.len_days(), range.len_days());
        assert_eq!(prev.start(), d("2026-03-01"));
    }

    #[test]
    fn single_day_range_covers_exactly_one_day() {
        let range = DateRange::single(d("2026-03-05"));
        assert_eq!(range.len_days(), 1);
        assert!(range.contains(d("2026-03-05")));
        assert!(!range.contains(d("2026-03-06")));
    }

    #[test]
    fn trailing_days_covers_requested_window() {
        let range = DateRange::trailing_days(d("2026-03-31"), 30).unwrap();
        assert_eq!(range.len_days(), 30);
        assert_eq!(range.end(), d("2026-03-31"));
        assert!(DateRange::trailing_days(d("2026-03-31"), 0).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any valid range iterates exactly `len_days` days,
            /// every one of which it `contains`, and its previous period is
            /// adjacent with the same length.
            #[test]
            fn day_iteration_matches_length_and_previous_is_adjacent(
                offset in 0i64..3000,
                len in 1i64..120,
            ) {
                let start = d("2020-01-01") + Duration::days(offset);
                let range = DateRange::new(start, start + Duration::days(len)).unwrap();

                prop_assert_eq!(range.days().count() as i64, range.len_days());
                for day in range.days() {
                    prop_assert!(range.contains(day));
                }
                prop_assert!(!range.contains(range.end()));

                let previous = range.previous();
                prop_assert_eq!(previous.end(), range.start());
                prop_assert_eq!(previous.len_days(), range.len_days());
            }
        }
    }
}
