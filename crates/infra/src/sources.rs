//! Collaborator boundaries.
//!
//! These traits wrap the externally-owned stores and feeds without making
//! any storage or transport assumptions. Implementations own caching and
//! mutation; the core treats every call as reading a fresh, possibly
//! changing view.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use arcops_analytics::{AssetMeta, RevenueFilters, RevenueRecord, StockSnapshot};
use arcops_attribution::{CurrentAssignment, DailyReading};
use arcops_core::{CarrierId, DateRange, SubjectId};
use arcops_events::AssignmentEvent;

/// An external fetch failed or timed out.
///
/// Inside an aggregation this degrades that call's contribution to zero
/// (logged); it only fails the whole query when every source failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Unavailable { source: &'static str, message: String },

    Timeout { source: &'static str },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { source, message } => {
                write!(f, "{source} unavailable: {message}")
            }
            Self::Timeout { source } => write!(f, "{source} timed out"),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    pub fn unavailable(source: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            source,
            message: message.into(),
        }
    }
}

/// Ordered, append-only change events for one subject.
#[async_trait]
pub trait EventLogSource: Send + Sync {
    async fn events(&self, subject_id: SubjectId) -> Result<Vec<AssignmentEvent>, SourceError>;
}

/// Per-carrier, per-day metered readings.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Readings for `carrier_id` on days in `[start, end)`.
    async fn readings(
        &self,
        carrier_id: CarrierId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, SourceError>;
}

/// Point-of-sale revenue feed.
///
/// `filters` are a push-down hint; the pipeline re-applies them
/// authoritatively after the fetch, so implementations may ignore them.
#[async_trait]
pub trait SalesFeed: Send + Sync {
    async fn fetch(
        &self,
        range: DateRange,
        filters: &RevenueFilters,
    ) -> Result<Vec<RevenueRecord>, SourceError>;
}

/// Per-machine telemetry feed, with play/win counters attached.
#[async_trait]
pub trait MachineFeed: Send + Sync {
    async fn fetch(
        &self,
        range: DateRange,
        filters: &RevenueFilters,
    ) -> Result<Vec<RevenueRecord>, SourceError>;
}

/// The catalog's view of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Materialized current-assignment fact, if any. Feeds the synthetic
    /// fallback for subjects predating the audit log.
    pub current_assignment: Option<CurrentAssignment>,
}

/// Stock catalog: current quantities, thresholds, and subject records.
#[async_trait]
pub trait StockCatalog: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<StockSnapshot>, SourceError>;

    /// `None` means the catalog does not know the subject at all, which is
    /// a caller-facing error upstream.
    async fn subject(&self, subject_id: SubjectId) -> Result<Option<SubjectRecord>, SourceError>;
}

/// Asset metadata for filter resolution, keyed by carrier tag.
#[async_trait]
pub trait AssetDirectory: Send + Sync {
    async fn lookup(&self, carrier_tag: &str) -> Result<Option<AssetMeta>, SourceError>;
}
