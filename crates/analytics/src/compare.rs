//! Period-over-period comparison and trend classification.

use serde::{Deserialize, Serialize};

use crate::pipeline::Overview;

/// Three-way trend label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// One metric compared against the immediately preceding period of equal
/// length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub metric: String,
    pub current_value: f64,
    pub previous_value: f64,
    pub change_percent: f64,
    pub trend: Trend,
}

/// Percentage change from `previous` to `current`.
///
/// Defined as exactly `0` when `previous` is `0` — never infinity, never
/// NaN, regardless of the current value.
pub fn change_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// The ±2% band suppresses noise-level fluctuations from being labeled
/// directional.
pub fn classify(change_percent: f64) -> Trend {
    if change_percent > 2.0 {
        Trend::Up
    } else if change_percent < -2.0 {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn compare_metric(metric: &str, current: f64, previous: f64) -> PeriodComparison {
    let change = change_percent(current, previous);
    PeriodComparison {
        metric: metric.to_string(),
        current_value: current,
        previous_value: previous,
        change_percent: change,
        trend: classify(change),
    }
}

/// Compare the standard dashboard metrics between two period overviews.
pub fn compare_overviews(current: &Overview, previous: &Overview) -> Vec<PeriodComparison> {
    vec![
        compare_metric("revenue", current.total_revenue, previous.total_revenue),
        compare_metric("plays", current.total_plays as f64, previous.total_plays as f64),
        compare_metric("wins", current.total_wins as f64, previous.total_wins as f64),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_percent_is_zero_when_previous_is_zero() {
        assert_eq!(change_percent(500.0, 0.0), 0.0);
        assert_eq!(change_percent(0.0, 0.0), 0.0);
        assert!(change_percent(500.0, 0.0).is_finite());
    }

    #[test]
    fn change_percent_is_signed() {
        assert_eq!(change_percent(110.0, 100.0), 10.0);
        assert_eq!(change_percent(90.0, 100.0), -10.0);
    }

    #[test]
    fn trend_band_suppresses_noise() {
        assert_eq!(classify(2.1), Trend::Up);
        assert_eq!(classify(2.0), Trend::Stable);
        assert_eq!(classify(0.0), Trend::Stable);
        assert_eq!(classify(-2.0), Trend::Stable);
        assert_eq!(classify(-2.1), Trend::Down);
    }

    #[test]
    fn compare_overviews_covers_revenue_plays_wins() {
        let current = Overview {
            total_revenue: 330.0,
            sales_revenue: 200.0,
            machine_revenue: 130.0,
            total_plays: 100,
            total_wins: 10,
            win_rate: 10.0,
            avg_revenue_per_play: 3.3,
        };
        let previous = Overview {
            total_revenue: 300.0,
            sales_revenue: 180.0,
            machine_revenue: 120.0,
            total_plays: 100,
            total_wins: 0,
            win_rate: 0.0,
            avg_revenue_per_play: 3.0,
        };

        let comparisons = compare_overviews(&current, &previous);
        assert_eq!(comparisons.len(), 3);

        assert_eq!(comparisons[0].metric, "revenue");
        assert_eq!(comparisons[0].change_percent, 10.0);
        assert_eq!(comparisons[0].trend, Trend::Up);

        assert_eq!(comparisons[1].metric, "plays");
        assert_eq!(comparisons[1].trend, Trend::Stable);

        // Previous wins were zero: change pinned to 0, not infinity.
        assert_eq!(comparisons[2].metric, "wins");
        assert_eq!(comparisons[2].change_percent, 0.0);
        assert_eq!(comparisons[2].trend, Trend::Stable);
    }
}
