//! Revenue record filtering and day-bucket aggregation.
//!
//! Two independently-sourced feeds (point-of-sale "sales" and per-machine
//! telemetry) are never merged at the source; they meet here, at
//! aggregation time, under a caller-selected mode.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which feed a record came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueSource {
    Sales,
    Machine,
}

/// How the two feeds combine into a total.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    Sales,
    Machine,
    Combined,
}

/// Coarse filters applied at aggregation time.
///
/// Location applies to both feeds. Type and group resolve through asset
/// metadata and therefore apply to the machine feed only: a sales record
/// has no type dimension, so a non-trivial type/group filter excludes the
/// sales feed outright rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueFilters {
    pub location: Option<String>,
    pub machine_type: Option<String>,
    pub group: Option<String>,
}

impl RevenueFilters {
    pub fn none() -> Self {
        Self::default()
    }

    /// True when a filter dimension the sales feed cannot express is active.
    pub fn has_type_dimension(&self) -> bool {
        self.machine_type.is_some() || self.group.is_some()
    }
}

/// One revenue row from either feed.
///
/// `key` is the location name for sales records and the carrier tag for
/// machine records. Play/win counters are only populated by the machine
/// feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub source: RevenueSource,
    pub key: String,
    pub cash_revenue: f64,
    pub card_revenue: f64,
    pub total: f64,
    pub plays: u64,
    pub wins: u64,
    /// Present in non-aggregated (per-day) responses.
    pub date: Option<NaiveDate>,
}

/// Asset metadata used to resolve machine-feed filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    pub location: String,
    pub machine_type: String,
    pub group: String,
}

/// One calendar day's aggregated revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub date: NaiveDate,
    pub revenue: f64,
    pub sales_revenue: f64,
    pub machine_revenue: f64,
    pub plays: u64,
    pub wins: u64,
}

/// Range-level aggregate with guarded derived rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_revenue: f64,
    pub sales_revenue: f64,
    pub machine_revenue: f64,
    pub total_plays: u64,
    pub total_wins: u64,
    /// Percentage; `0` when there were no plays.
    pub win_rate: f64,
    /// `0` when there were no plays.
    pub avg_revenue_per_play: f64,
}

/// Filter sales-feed records. Returns nothing when a type/group filter is
/// active, since sales cannot be attributed to a type.
pub fn filter_sales(records: Vec<RevenueRecord>, filters: &RevenueFilters) -> Vec<RevenueRecord> {
    if filters.has_type_dimension() {
        return Vec::new();
    }
    match &filters.location {
        None => records,
        Some(location) => records.into_iter().filter(|r| &r.key == location).collect(),
    }
}

/// Filter machine-feed records through asset metadata.
///
/// A record whose carrier tag resolves to no metadata is kept only when no
/// filter is active; with an active filter it cannot be proven to match, so
/// it is excluded.
pub fn filter_machine(
    records: Vec<RevenueRecord>,
    filters: &RevenueFilters,
    assets: &HashMap<String, AssetMeta>,
) -> Vec<RevenueRecord> {
    let unfiltered =
        filters.location.is_none() && filters.machine_type.is_none() && filters.group.is_none();
    if unfiltered {
        return records;
    }
    records
        .into_iter()
        .filter(|record| match assets.get(&record.key) {
            None => false,
            Some(meta) => {
                filters.location.as_ref().is_none_or(|l| &meta.location == l)
                    && filters.machine_type.as_ref().is_none_or(|t| &meta.machine_type == t)
                    && filters.group.as_ref().is_none_or(|g| &meta.group == g)
            }
        })
        .collect()
}

/// Merge one day's filtered records from both feeds into a bucket.
pub fn bucket(
    date: NaiveDate,
    sales: &[RevenueRecord],
    machine: &[RevenueRecord],
    mode: SourceMode,
) -> TimeBucket {
    let sales_revenue: f64 = sales.iter().map(|r| r.total).sum();
    let machine_revenue: f64 = machine.iter().map(|r| r.total).sum();
    let revenue = match mode {
        SourceMode::Sales => sales_revenue,
        SourceMode::Machine => machine_revenue,
        SourceMode::Combined => sales_revenue + machine_revenue,
    };
    TimeBucket {
        date,
        revenue,
        sales_revenue,
        machine_revenue,
        plays: machine.iter().map(|r| r.plays).sum(),
        wins: machine.iter().map(|r| r.wins).sum(),
    }
}

/// Build a range-level overview straight from filtered records, for callers
/// that fetched the whole range in one shot instead of per day.
pub fn overview_records(
    sales: &[RevenueRecord],
    machine: &[RevenueRecord],
    mode: SourceMode,
) -> Overview {
    let sales_revenue: f64 = sales.iter().map(|r| r.total).sum();
    let machine_revenue: f64 = machine.iter().map(|r| r.total).sum();
    let total_revenue = match mode {
        SourceMode::Sales => sales_revenue,
        SourceMode::Machine => machine_revenue,
        SourceMode::Combined => sales_revenue + machine_revenue,
    };
    let total_plays: u64 = machine.iter().map(|r| r.plays).sum();
    let total_wins: u64 = machine.iter().map(|r| r.wins).sum();
    Overview {
        total_revenue,
        sales_revenue,
        machine_revenue,
        total_plays,
        total_wins,
        win_rate: guarded_rate(total_wins as f64 * 100.0, total_plays as f64),
        avg_revenue_per_play: guarded_rate(total_revenue, total_plays as f64),
    }
}

/// Collapse buckets into a range-level overview with guarded rates.
pub fn overview(buckets: &[TimeBucket]) -> Overview {
    let total_revenue: f64 = buckets.iter().map(|b| b.revenue).sum();
    let sales_revenue: f64 = buckets.iter().map(|b| b.sales_revenue).sum();
    let machine_revenue: f64 = buckets.iter().map(|b| b.machine_revenue).sum();
    let total_plays: u64 = buckets.iter().map(|b| b.plays).sum();
    let total_wins: u64 = buckets.iter().map(|b| b.wins).sum();

    Overview {
        total_revenue,
        sales_revenue,
        machine_revenue,
        total_plays,
        total_wins,
        win_rate: guarded_rate(total_wins as f64 * 100.0, total_plays as f64),
        avg_revenue_per_play: guarded_rate(total_revenue, total_plays as f64),
    }
}

/// `numerator / denominator`, pinned to `0` for a zero denominator. Never
/// infinity, never NaN.
fn guarded_rate(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Smooth a day-bucketed series with a trailing moving average.
///
/// The first `window - 1` points are passed through unchanged, as there is
/// not yet a full window behind them.
pub fn moving_average(series: &[TimeBucket], window: usize) -> Vec<TimeBucket> {
    if window < 2 || series.len() < window {
        return series.to_vec();
    }
    series
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if i + 1 < window {
                return item.clone();
            }
            let slice = &series[i + 1 - window..=i];
            let n = window as f64;
            TimeBucket {
                date: item.date,
                revenue: slice.iter().map(|b| b.revenue).sum::<f64>() / n,
                sales_revenue: slice.iter().map(|b| b.sales_revenue).sum::<f64>() / n,
                machine_revenue: slice.iter().map(|b| b.machine_revenue).sum::<f64>() / n,
                plays: (slice.iter().map(|b| b.plays).sum::<u64>() as f64 / n).round() as u64,
                wins: (slice.iter().map(|b| b.wins).sum::<u64>() as f64 / n).round() as u64,
            }
        })
        .collect()
}

/// Machine revenue grouped by resolved location, highest revenue first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRevenue {
    pub location: String,
    pub revenue: f64,
    pub machines: usize,
}

pub fn revenue_by_location(
    records: &[RevenueRecord],
    assets: &HashMap<String, AssetMeta>,
) -> Vec<LocationRevenue> {
    let mut by_location: HashMap<&str, (f64, usize)> = HashMap::new();
    for record in records {
        let location = assets
            .get(&record.key)
            .map(|m| m.location.as_str())
            .unwrap_or("Unknown");
        let entry = by_location.entry(location).or_default();
        entry.0 += record.total;
        entry.1 += 1;
    }
    let mut result: Vec<_> = by_location
        .into_iter()
        .map(|(location, (revenue, machines))| LocationRevenue {
            location: location.to_string(),
            revenue,
            machines,
        })
        .collect();
    result.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    result
}

/// Machine revenue grouped by asset type, highest revenue first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRevenue {
    pub machine_type: String,
    pub revenue: f64,
    pub count: usize,
    pub avg_revenue: f64,
}

pub fn revenue_by_machine_type(
    records: &[RevenueRecord],
    assets: &HashMap<String, AssetMeta>,
) -> Vec<TypeRevenue> {
    let mut by_type: HashMap<&str, (f64, usize)> = HashMap::new();
    for record in records {
        let machine_type = assets
            .get(&record.key)
            .map(|m| m.machine_type.as_str())
            .unwrap_or("Unknown");
        let entry = by_type.entry(machine_type).or_default();
        entry.0 += record.total;
        entry.1 += 1;
    }
    let mut result: Vec<_> = by_type
        .into_iter()
        .map(|(machine_type, (revenue, count))| TypeRevenue {
            machine_type: machine_type.to_string(),
            revenue,
            count,
            avg_revenue: guarded_rate(revenue, count as f64),
        })
        .collect();
    result.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    result
}
