//! Short-horizon revenue projection.
//!
//! The projection is a linearly-weighted moving average over the supplied
//! history — the most recent day carries the highest weight, so the curve
//! tracks recent momentum rather than a flat mean. The per-day jitter is a
//! presentation heuristic to avoid a perfectly flat line; it is NOT a
//! confidence interval and carries no statistical meaning.

use chrono::{Datelike, Duration, Weekday};
use rand::Rng;

use crate::pipeline::TimeBucket;

/// Weekend uplift applied to projected Saturdays and Sundays.
const WEEKEND_MULTIPLIER: f64 = 1.15;

/// Bounded multiplicative jitter: each projected value is scaled by a factor
/// in `[1 - JITTER, 1 + JITTER]`.
const JITTER: f64 = 0.05;

/// Linearly-weighted average: weight of position `i` is `i + 1`.
fn weighted_average(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (i, value) in values.enumerate() {
        let weight = (i + 1) as f64;
        weighted_sum += value * weight;
        weight_total += weight;
    }
    weighted_sum / weight_total
}

/// Project `horizon_days` synthetic, future-dated buckets from a
/// day-bucketed history (ascending by date). Empty history projects
/// nothing.
pub fn project(history: &[TimeBucket], horizon_days: u32) -> Vec<TimeBucket> {
    project_with(history, horizon_days, &mut rand::thread_rng())
}

/// [`project`] with an injected randomness source, for tests.
pub fn project_with<R: Rng>(history: &[TimeBucket], horizon_days: u32, rng: &mut R) -> Vec<TimeBucket> {
    let Some(last) = history.last() else {
        return Vec::new();
    };

    let base_revenue = weighted_average(history.iter().map(|b| b.revenue));
    let base_sales = weighted_average(history.iter().map(|b| b.sales_revenue));
    let base_machine = weighted_average(history.iter().map(|b| b.machine_revenue));
    let base_plays = weighted_average(history.iter().map(|b| b.plays as f64));
    let base_wins = weighted_average(history.iter().map(|b| b.wins as f64));

    (1..=i64::from(horizon_days))
        .map(|offset| {
            let date = last.date + Duration::days(offset);
            let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            let seasonal = if weekend { WEEKEND_MULTIPLIER } else { 1.0 };
            let mut scale = |base: f64| {
                let jitter = rng.gen_range(1.0 - JITTER..=1.0 + JITTER);
                base * seasonal * jitter
            };
            let revenue = scale(base_revenue);
            let sales_revenue = scale(base_sales);
            let machine_revenue = scale(base_machine);
            let plays = scale(base_plays).round().max(0.0) as u64;
            let wins = scale(base_wins).round().max(0.0) as u64;
            TimeBucket {
                date,
                revenue,
                sales_revenue,
                machine_revenue,
                plays,
                wins,
            }
        })
        .collect()
}
