//! Fleet-level revenue analytics over the two feeds.
//!
//! Every multi-fetch call issues its fetches concurrently — bounded by
//! [`MAX_CONCURRENT_FETCHES`] — and joins them all; nothing is raced.
//! Result order is an explicit sort, never an artifact of completion order.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::warn;

use arcops_analytics::{
    bucket, compare_overviews, filter_machine, filter_sales, overview_records, prioritize,
    project, revenue_by_location, revenue_by_machine_type, AssetMeta, LocationRevenue, Overview,
    PeriodComparison, ReorderRecommendation, RevenueFilters, RevenueRecord, SourceMode,
    TimeBucket, TypeRevenue,
};
use arcops_core::{DateRange, DomainError};

use crate::services::MAX_CONCURRENT_FETCHES;
use crate::sources::{AssetDirectory, MachineFeed, SalesFeed, SourceError, StockCatalog};

/// How much history feeds the revenue projection.
const FORECAST_HISTORY_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Every fetch behind the query failed; a partial answer is possible
    /// with one surviving source, but not with none.
    #[error("all revenue sources failed for {context}")]
    AllSourcesFailed { context: &'static str },
}

fn soften(
    result: Result<Vec<RevenueRecord>, SourceError>,
    source: &'static str,
    range: DateRange,
) -> Vec<RevenueRecord> {
    match result {
        Ok(records) => records,
        Err(error) => {
            warn!(%range, source, %error, "feed fetch failed, this fetch contributes zero");
            Vec::new()
        }
    }
}

/// Aggregates the point-of-sale and per-machine feeds into dashboard
/// queries: overviews, day series, period comparisons, projections,
/// groupings, and stock reorder recommendations.
pub struct AnalyticsService<S, M, A, C> {
    sales: S,
    machine: M,
    assets: A,
    catalog: C,
}

impl<S, M, A, C> AnalyticsService<S, M, A, C>
where
    S: SalesFeed,
    M: MachineFeed,
    A: AssetDirectory,
    C: StockCatalog,
{
    pub fn new(sales: S, machine: M, assets: A, catalog: C) -> Self {
        Self {
            sales,
            machine,
            assets,
            catalog,
        }
    }

    /// Range-level aggregate under the selected source mode and filters.
    pub async fn overview(
        &self,
        range: DateRange,
        mode: SourceMode,
        filters: &RevenueFilters,
    ) -> Result<Overview, AnalyticsError> {
        let (sales, machine) = self.fetch_range(range, filters, "overview").await?;
        let assets = self.resolve_assets(&machine).await;
        let sales = filter_sales(sales, filters);
        let machine = filter_machine(machine, filters, &assets);
        Ok(overview_records(&sales, &machine, mode))
    }

    /// One bucket per calendar day in `range`, ascending by date.
    ///
    /// Both feeds are fetched per day with bounded concurrency and joined;
    /// a failed fetch degrades that day's contribution to zero. The call
    /// fails only when every fetch across the range failed.
    pub async fn time_series(
        &self,
        range: DateRange,
        mode: SourceMode,
        filters: &RevenueFilters,
    ) -> Result<Vec<TimeBucket>, AnalyticsError> {
        let sales_feed = &self.sales;
        let machine_feed = &self.machine;
        let fetches = range.days().map(|day| {
            let day_range = DateRange::single(day);
            async move {
                let (sales, machine) = tokio::join!(
                    sales_feed.fetch(day_range, filters),
                    machine_feed.fetch(day_range, filters)
                );
                (day, sales, machine)
            }
        });
        let fetched: Vec<_> = stream::iter(fetches)
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let total_fetches = fetched.len() * 2;
        let mut failed = 0usize;
        let mut days = Vec::with_capacity(fetched.len());
        for (day, sales, machine) in fetched {
            failed += usize::from(sales.is_err()) + usize::from(machine.is_err());
            let day_range = DateRange::single(day);
            days.push((
                day,
                soften(sales, "sales feed", day_range),
                soften(machine, "machine feed", day_range),
            ));
        }
        if failed == total_fetches {
            return Err(AnalyticsError::AllSourcesFailed {
                context: "time series",
            });
        }

        let all_machine: Vec<RevenueRecord> = days
            .iter()
            .flat_map(|(_, _, machine)| machine.iter().cloned())
            .collect();
        let assets = self.resolve_assets(&all_machine).await;

        let mut buckets: Vec<TimeBucket> = days
            .into_iter()
            .map(|(day, sales, machine)| {
                let sales = filter_sales(sales, filters);
                let machine = filter_machine(machine, filters, &assets);
                bucket(day, &sales, &machine, mode)
            })
            .collect();
        // `buffered` preserves submission order, but sortedness is part of
        // the contract, not an inherited accident.
        buckets.sort_by_key(|b| b.date);
        Ok(buckets)
    }

    /// Compare `range` against the immediately preceding period of equal
    /// length.
    pub async fn compare(
        &self,
        range: DateRange,
        mode: SourceMode,
        filters: &RevenueFilters,
    ) -> Result<Vec<PeriodComparison>, AnalyticsError> {
        let previous = range.previous();
        let (current, prior) = tokio::join!(
            self.overview(range, mode, filters),
            self.overview(previous, mode, filters)
        );
        Ok(compare_overviews(&current?, &prior?))
    }

    /// Project `horizon_days` of combined revenue from recent history.
    pub async fn forecast(&self, horizon_days: u32) -> Result<Vec<TimeBucket>, AnalyticsError> {
        self.forecast_from(Utc::now().date_naive(), horizon_days).await
    }

    /// [`Self::forecast`] anchored on an explicit "today", for tests.
    pub async fn forecast_from(
        &self,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<TimeBucket>, AnalyticsError> {
        let history_range =
            DateRange::trailing_days(today + Duration::days(1), FORECAST_HISTORY_DAYS)?;
        let history = self
            .time_series(history_range, SourceMode::Combined, &RevenueFilters::none())
            .await?;
        Ok(project(&history, horizon_days))
    }

    /// Reorder recommendations from the current stock snapshot, most urgent
    /// first.
    pub async fn reorder_recommendations(
        &self,
        include_low: bool,
    ) -> Result<Vec<ReorderRecommendation>, AnalyticsError> {
        let snapshots = self.catalog.snapshot().await?;
        Ok(prioritize(&snapshots, include_low))
    }

    /// Machine revenue grouped by resolved location, highest first.
    pub async fn revenue_by_location(
        &self,
        range: DateRange,
        filters: &RevenueFilters,
    ) -> Result<Vec<LocationRevenue>, AnalyticsError> {
        let records = self.machine.fetch(range, filters).await?;
        let assets = self.resolve_assets(&records).await;
        let records = filter_machine(records, filters, &assets);
        Ok(revenue_by_location(&records, &assets))
    }

    /// Machine revenue grouped by asset type, highest first.
    pub async fn revenue_by_machine_type(
        &self,
        range: DateRange,
        filters: &RevenueFilters,
    ) -> Result<Vec<TypeRevenue>, AnalyticsError> {
        let records = self.machine.fetch(range, filters).await?;
        let assets = self.resolve_assets(&records).await;
        let records = filter_machine(records, filters, &assets);
        Ok(revenue_by_machine_type(&records, &assets))
    }

    /// Fetch both feeds over one range, degrading a single failure to an
    /// empty contribution. Fails only when both feeds failed.
    async fn fetch_range(
        &self,
        range: DateRange,
        filters: &RevenueFilters,
        context: &'static str,
    ) -> Result<(Vec<RevenueRecord>, Vec<RevenueRecord>), AnalyticsError> {
        let (sales, machine) = tokio::join!(
            self.sales.fetch(range, filters),
            self.machine.fetch(range, filters)
        );
        if let (Err(sales_error), Err(machine_error)) = (&sales, &machine) {
            warn!(%range, %sales_error, %machine_error, "both revenue feeds failed");
            return Err(AnalyticsError::AllSourcesFailed { context });
        }
        Ok((
            soften(sales, "sales feed", range),
            soften(machine, "machine feed", range),
        ))
    }

    /// Resolve asset metadata for every distinct carrier tag in `records`.
    /// Lookups run with bounded concurrency; a failed lookup is treated as
    /// missing metadata.
    async fn resolve_assets(&self, records: &[RevenueRecord]) -> HashMap<String, AssetMeta> {
        let keys: HashSet<&str> = records.iter().map(|r| r.key.as_str()).collect();
        let directory = &self.assets;
        let lookups = keys
            .into_iter()
            .map(|key| async move { (key, directory.lookup(key).await) });
        let looked_up: Vec<_> = stream::iter(lookups)
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let mut resolved = HashMap::new();
        for (key, result) in looked_up {
            match result {
                Ok(Some(meta)) => {
                    resolved.insert(key.to_string(), meta);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(carrier_tag = key, %error, "asset lookup failed, treating metadata as missing");
                }
            }
        }
        resolved
    }
}
