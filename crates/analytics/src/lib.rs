//! `arcops-analytics` — revenue aggregation math and derived analytics.
//!
//! Pure functions over already-fetched revenue records; the concurrent
//! per-day fetching lives in `arcops-infra` so everything here stays
//! synchronous and unit-testable.

pub mod compare;
pub mod forecast;
pub mod pipeline;
pub mod reorder;

pub use compare::{change_percent, classify, compare_overviews, PeriodComparison, Trend};
pub use forecast::project;
pub use pipeline::{
    bucket, filter_machine, filter_sales, moving_average, overview, overview_records, revenue_by_location,
    revenue_by_machine_type, AssetMeta, LocationRevenue, Overview, RevenueFilters, RevenueRecord,
    RevenueSource, SourceMode, TimeBucket, TypeRevenue,
};
pub use reorder::{
    prioritize, ReorderPriority, ReorderRecommendation, StockSnapshot, STOCKOUT_INDETERMINATE,
};
