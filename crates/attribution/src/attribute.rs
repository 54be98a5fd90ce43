//! Interval clipping and revenue attribution.
//!
//! Attribution is additive over sub-ranges: summation is linear and clipping
//! is exact at boundaries, so attributing over `[a, c)` equals attributing
//! over `[a, b)` plus `[b, c)`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use arcops_core::{CarrierId, DateRange, SubjectId};

use crate::reading::DailyReading;
use crate::timeline::AssignmentInterval;

/// An interval clipped to a query range, with both bounds resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedInterval {
    pub carrier_id: CarrierId,
    pub carrier_label: String,
    pub start: DateTime<Utc>,
    /// Exclusive.
    pub end: DateTime<Utc>,
    pub synthetic: bool,
}

impl ClippedInterval {
    /// Day-granularity ownership: a calendar day's reading belongs to the
    /// interval assigned at the start of that day. Deterministic and
    /// non-double-counting even for mid-day transfers.
    pub fn covers_day(&self, date: NaiveDate) -> bool {
        let day_start = date.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc();
        self.start <= day_start && day_start < self.end
    }

    /// The calendar-day span to fetch readings for.
    pub fn day_span(&self) -> (NaiveDate, NaiveDate) {
        (self.start.date_naive(), self.end.date_naive().succ_opt().unwrap_or(self.end.date_naive()))
    }
}

/// One breakdown entry: a carrier's contribution over one clipped period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierPeriod {
    pub carrier_id: CarrierId,
    pub carrier_label: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub revenue: f64,
    pub plays: u64,
    pub day_count: u32,
    pub synthetic: bool,
}

/// Derived, recomputed per query; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedRevenue {
    pub subject_id: SubjectId,
    pub total_revenue: f64,
    pub total_plays: u64,
    pub breakdown: Vec<CarrierPeriod>,
}

impl AttributedRevenue {
    pub fn empty(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            total_revenue: 0.0,
            total_plays: 0,
            breakdown: Vec::new(),
        }
    }
}

/// Clip intervals to a query range.
///
/// An interval wholly outside the range is dropped entirely; a surviving
/// interval has its bounds pinned exactly to the range, never yielding a
/// negative-length result.
pub fn clip_intervals(
    intervals: &[AssignmentInterval],
    range: DateRange,
    now: DateTime<Utc>,
) -> Vec<ClippedInterval> {
    intervals
        .iter()
        .filter_map(|interval| {
            let start = interval.start.max(range.start_instant());
            let end = interval.end_or(now).min(range.end_instant());
            (start < end).then(|| ClippedInterval {
                carrier_id: interval.carrier_id,
                carrier_label: interval.carrier_label.clone(),
                start,
                end,
                synthetic: interval.synthetic,
            })
        })
        .collect()
}

/// Sum per-interval readings into an attribution result.
///
/// Zero-revenue periods are omitted from the breakdown (idle periods would
/// only clutter the output) but still contribute zero to the totals, so
/// totals stay additive. Breakdown entries come out sorted by period start
/// regardless of input order.
pub fn summarize(
    subject_id: SubjectId,
    mut parts: Vec<(ClippedInterval, Vec<DailyReading>)>,
) -> AttributedRevenue {
    parts.sort_by_key(|(interval, _)| interval.start);

    let mut result = AttributedRevenue::empty(subject_id);
    for (interval, readings) in parts {
        let mut revenue = 0.0;
        let mut plays = 0u64;
        let mut day_count = 0u32;
        for reading in &readings {
            if reading.carrier_id == interval.carrier_id && interval.covers_day(reading.date) {
                revenue += reading.revenue;
                plays += reading.play_count;
                day_count += 1;
            }
        }

        result.total_revenue += revenue;
        result.total_plays += plays;
        if revenue != 0.0 {
            result.breakdown.push(CarrierPeriod {
                carrier_id: interval.carrier_id,
                carrier_label: interval.carrier_label,
                period_start: interval.start,
                period_end: interval.end,
                revenue,
                plays,
                day_count,
                synthetic: interval.synthetic,
            });
        }
    }
    result
}

/// Attribute pre-fetched readings to a subject's intervals over a range.
pub fn attribute(
    subject_id: SubjectId,
    intervals: &[AssignmentInterval],
    readings_by_carrier: &HashMap<CarrierId, Vec<DailyReading>>,
    range: DateRange,
    now: DateTime<Utc>,
) -> AttributedRevenue {
    let parts = clip_intervals(intervals, range, now)
        .into_iter()
        .map(|clipped| {
            let readings = readings_by_carrier
                .get(&clipped.carrier_id)
                .cloned()
                .unwrap_or_default();
            (clipped, readings)
        })
        .collect();
    summarize(subject_id, parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn interval(
        subject: SubjectId,
        carrier: CarrierId,
        start: u32,
        end: Option<u32>,
    ) -> AssignmentInterval {
        AssignmentInterval {
            subject_id: subject,
            carrier_id: carrier,
            carrier_label: "M".to_string(),
            start: ts(start),
            end: end.map(ts),
            synthetic: false,
        }
    }

    fn readings(carrier: CarrierId, days: impl IntoIterator<Item = u32>, revenue: f64) -> Vec<DailyReading> {
        days.into_iter()
            .map(|day| DailyReading {
                carrier_id: carrier,
                date: date(day),
                revenue,
                play_count: 10,
            })
            .collect()
    }

    #[test]
    fn interval_outside_range_is_dropped_not_clipped_negative() {
        let subject = SubjectId::new();
        let carrier = CarrierId::new();
        let intervals = vec![interval(subject, carrier, 1, Some(5))];
        let range = DateRange::new(date(10), date(20)).unwrap();

        let clipped = clip_intervals(&intervals, range, ts(28));
        assert!(clipped.is_empty());
    }

    #[test]
    fn clip_pins_bounds_exactly_to_range() {
        let subject = SubjectId::new();
        let carrier = CarrierId::new();
        let intervals = vec![interval(subject, carrier, 1, None)];
        let range = DateRange::new(date(10), date(20)).unwrap();

        let clipped = clip_intervals(&intervals, range, ts(28));
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].start, ts(10));
        assert_eq!(clipped[0].end, ts(20));
        assert!(clipped[0].start < clipped[0].end);
    }

    #[test]
    fn transfer_scenario_attributes_750_across_two_periods() {
        // Assign->M1 @ day1, Transfer->M2 @ day11, Unassign @ day21.
        // M1 readings day1-10 sum to 450, M2 readings day11-20 sum to 300.
        let subject = SubjectId::new();
        let m1 = CarrierId::new();
        let m2 = CarrierId::new();
        let intervals = vec![
            interval(subject, m1, 1, Some(11)),
            interval(subject, m2, 11, Some(21)),
        ];
        let mut by_carrier = HashMap::new();
        by_carrier.insert(m1, readings(m1, 1..=10, 45.0));
        by_carrier.insert(m2, readings(m2, 11..=20, 30.0));

        let range = DateRange::new(date(1), date(21)).unwrap();
        let result = attribute(subject, &intervals, &by_carrier, range, ts(28));

        assert_eq!(result.total_revenue, 750.0);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[0].carrier_id, m1);
        assert_eq!(result.breakdown[0].revenue, 450.0);
        assert_eq!(result.breakdown[0].period_start, ts(1));
        assert_eq!(result.breakdown[0].period_end, ts(11));
        assert_eq!(result.breakdown[1].carrier_id, m2);
        assert_eq!(result.breakdown[1].revenue, 300.0);
        assert_eq!(result.breakdown[1].period_start, ts(11));
        assert_eq!(result.breakdown[1].period_end, ts(21));
    }

    #[test]
    fn zero_revenue_period_omitted_from_breakdown_but_counted_in_totals() {
        let subject = SubjectId::new();
        let m1 = CarrierId::new();
        let m2 = CarrierId::new();
        let intervals = vec![
            interval(subject, m1, 1, Some(11)),
            interval(subject, m2, 11, Some(21)),
        ];
        let mut by_carrier = HashMap::new();
        by_carrier.insert(m1, readings(m1, 1..=10, 45.0));
        // M2 reports plays but no revenue: omitted from breakdown, plays
        // still land in the totals.
        by_carrier.insert(m2, readings(m2, 11..=20, 0.0));

        let range = DateRange::new(date(1), date(21)).unwrap();
        let result = attribute(subject, &intervals, &by_carrier, range, ts(28));

        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].carrier_id, m1);
        assert_eq!(result.total_revenue, 450.0);
        assert_eq!(result.total_plays, 200);
    }

    #[test]
    fn midday_transfer_does_not_double_count_the_boundary_day() {
        let subject = SubjectId::new();
        let m1 = CarrierId::new();
        let m2 = CarrierId::new();
        let noon = Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap();
        let intervals = vec![
            AssignmentInterval {
                end: Some(noon),
                ..interval(subject, m1, 1, Some(11))
            },
            AssignmentInterval {
                start: noon,
                ..interval(subject, m2, 11, Some(21))
            },
        ];
        let mut by_carrier = HashMap::new();
        by_carrier.insert(m1, readings(m1, 1..=11, 10.0));
        by_carrier.insert(m2, readings(m2, 11..=20, 10.0));

        let range = DateRange::new(date(1), date(21)).unwrap();
        let result = attribute(subject, &intervals, &by_carrier, range, ts(28));

        // Day 11 starts while M1 is still assigned, so M1 owns it; M2's
        // day-11 reading is not attributed.
        assert_eq!(result.breakdown[0].revenue, 110.0);
        assert_eq!(result.breakdown[1].revenue, 90.0);
        assert_eq!(result.total_revenue, 200.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: clipping never yields start > end; wholly-outside
            /// intervals are dropped.
            #[test]
            fn clipping_never_goes_negative(
                istart in 1u32..25,
                ilen in 0u32..20,
                qstart in 1u32..25,
                qlen in 1u32..10,
            ) {
                let subject = SubjectId::new();
                let carrier = CarrierId::new();
                let iend = (istart + ilen).min(27);
                let intervals = vec![interval(
                    subject,
                    carrier,
                    istart,
                    (iend > istart).then_some(iend),
                )];
                let qend = (qstart + qlen).min(28);
                prop_assume!(qend > qstart);
                let range = DateRange::new(date(qstart), date(qend)).unwrap();

                for clipped in clip_intervals(&intervals, range, ts(28)) {
                    prop_assert!(clipped.start < clipped.end);
                    prop_assert!(clipped.start >= range.start_instant());
                    prop_assert!(clipped.end <= range.end_instant());
                }
            }

            /// Property: attribution is additive over sub-ranges when
            /// readings partition cleanly by day.
            #[test]
            fn attribution_is_additive_over_subranges(
                split in 2u32..27,
                revenues in proptest::collection::vec(0.0f64..100.0, 26),
            ) {
                let subject = SubjectId::new();
                let m1 = CarrierId::new();
                let m2 = CarrierId::new();
                let intervals = vec![
                    interval(subject, m1, 1, Some(14)),
                    interval(subject, m2, 14, None),
                ];
                let mut by_carrier: HashMap<CarrierId, Vec<DailyReading>> = HashMap::new();
                for (i, revenue) in revenues.iter().enumerate() {
                    let day = i as u32 + 1;
                    let carrier = if day < 14 { m1 } else { m2 };
                    by_carrier.entry(carrier).or_default().push(DailyReading {
                        carrier_id: carrier,
                        date: date(day),
                        revenue: *revenue,
                        play_count: 3,
                    });
                }

                let now = ts(28);
                let whole = DateRange::new(date(1), date(28)).unwrap();
                let left = DateRange::new(date(1), date(split)).unwrap();
                let right = DateRange::new(date(split), date(28)).unwrap();

                let total = attribute(subject, &intervals, &by_carrier, whole, now);
                let a = attribute(subject, &intervals, &by_carrier, left, now);
                let b = attribute(subject, &intervals, &by_carrier, right, now);

                prop_assert!((total.total_revenue - (a.total_revenue + b.total_revenue)).abs() < 1e-6);
                prop_assert_eq!(total.total_plays, a.total_plays + b.total_plays);
            }
        }
    }
}
