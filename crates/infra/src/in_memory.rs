//! In-memory collaborator doubles.
//!
//! Intended for tests/dev. Not optimized for performance. The feed doubles
//! support failure injection and artificial per-day latency so tests can
//! exercise soft-fail behavior and completion-order independence.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use arcops_analytics::{AssetMeta, RevenueFilters, RevenueRecord, StockSnapshot};
use arcops_attribution::DailyReading;
use arcops_core::{CarrierId, DateRange, SubjectId};
use arcops_events::AssignmentEvent;

use crate::sources::{
    AssetDirectory, EventLogSource, MachineFeed, ReadingStore, SalesFeed, SourceError,
    StockCatalog, SubjectRecord,
};

fn poisoned(source: &'static str) -> SourceError {
    SourceError::unavailable(source, "lock poisoned")
}

/// In-memory append-only event log, one stream per subject.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    streams: RwLock<HashMap<SubjectId, Vec<AssignmentEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: AssignmentEvent) {
        let mut streams = self.streams.write().expect("test double lock");
        streams.entry(event.subject_id).or_default().push(event);
    }
}

#[async_trait]
impl EventLogSource for InMemoryEventLog {
    async fn events(&self, subject_id: SubjectId) -> Result<Vec<AssignmentEvent>, SourceError> {
        let streams = self.streams.read().map_err(|_| poisoned("event log"))?;
        let mut events = streams.get(&subject_id).cloned().unwrap_or_default();
        events.sort_by_key(|e| e.occurred_at);
        Ok(events)
    }
}

/// In-memory reading store, one row set per carrier.
#[derive(Debug, Default)]
pub struct InMemoryReadingStore {
    rows: RwLock<HashMap<CarrierId, Vec<DailyReading>>>,
    failing: RwLock<HashSet<CarrierId>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reading: DailyReading) {
        let mut rows = self.rows.write().expect("test double lock");
        rows.entry(reading.carrier_id).or_default().push(reading);
    }

    /// Make all subsequent fetches for `carrier_id` fail.
    pub fn fail_carrier(&self, carrier_id: CarrierId) {
        self.failing.write().expect("test double lock").insert(carrier_id);
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn readings(
        &self,
        carrier_id: CarrierId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, SourceError> {
        if self
            .failing
            .read()
            .map_err(|_| poisoned("reading store"))?
            .contains(&carrier_id)
        {
            return Err(SourceError::unavailable("reading store", "injected failure"));
        }
        let rows = self.rows.read().map_err(|_| poisoned("reading store"))?;
        Ok(rows
            .get(&carrier_id)
            .map(|readings| {
                readings
                    .iter()
                    .filter(|r| r.date >= start && r.date < end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Shared body of the two in-memory feeds.
#[derive(Debug, Default)]
struct FeedState {
    records: RwLock<HashMap<NaiveDate, Vec<RevenueRecord>>>,
    fail_dates: RwLock<HashSet<NaiveDate>>,
    fail_all: RwLock<bool>,
    delays: RwLock<HashMap<NaiveDate, Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FeedState {
    fn insert(&self, date: NaiveDate, record: RevenueRecord) {
        let mut records = self.records.write().expect("test double lock");
        records.entry(date).or_default().push(record);
    }

    async fn fetch(&self, source: &'static str, range: DateRange) -> Result<Vec<RevenueRecord>, SourceError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        let result = self.fetch_inner(source, range).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn fetch_inner(&self, source: &'static str, range: DateRange) -> Result<Vec<RevenueRecord>, SourceError> {
        let delay = {
            let delays = self.delays.read().map_err(|_| poisoned(source))?;
            delays.get(&range.start()).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_all.read().map_err(|_| poisoned(source))? {
            return Err(SourceError::unavailable(source, "injected failure"));
        }
        {
            let fail_dates = self.fail_dates.read().map_err(|_| poisoned(source))?;
            if range.days().any(|d| fail_dates.contains(&d)) {
                return Err(SourceError::unavailable(source, "injected failure"));
            }
        }

        let records = self.records.read().map_err(|_| poisoned(source))?;
        Ok(range
            .days()
            .flat_map(|d| records.get(&d).cloned().unwrap_or_default())
            .collect())
    }
}

macro_rules! in_memory_feed {
    ($name:ident, $trait_:ident, $label:literal) => {
        /// In-memory revenue feed double.
        ///
        /// Cheaply cloneable; clones share state, so a test can keep a
        /// handle after moving the feed into a service.
        #[derive(Debug, Default, Clone)]
        pub struct $name {
            state: Arc<FeedState>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Highest number of fetches ever in flight at once.
            pub fn max_in_flight(&self) -> usize {
                self.state.max_in_flight.load(Ordering::SeqCst)
            }

            pub fn insert(&self, date: NaiveDate, record: RevenueRecord) {
                self.state.insert(date, record);
            }

            /// Make fetches touching `date` fail.
            pub fn fail_date(&self, date: NaiveDate) {
                self.state.fail_dates.write().expect("test double lock").insert(date);
            }

            /// Make every fetch fail.
            pub fn fail_all(&self) {
                *self.state.fail_all.write().expect("test double lock") = true;
            }

            /// Delay fetches whose range starts at `date`, to scramble
            /// completion order in tests.
            pub fn delay_date(&self, date: NaiveDate, delay: Duration) {
                self.state.delays.write().expect("test double lock").insert(date, delay);
            }
        }

        #[async_trait]
        impl $trait_ for $name {
            async fn fetch(
                &self,
                range: DateRange,
                _filters: &RevenueFilters,
            ) -> Result<Vec<RevenueRecord>, SourceError> {
                self.state.fetch($label, range).await
            }
        }
    };
}

in_memory_feed!(InMemorySalesFeed, SalesFeed, "sales feed");
in_memory_feed!(InMemoryMachineFeed, MachineFeed, "machine feed");

/// In-memory stock catalog.
#[derive(Debug, Default)]
pub struct InMemoryStockCatalog {
    subjects: RwLock<HashMap<SubjectId, SubjectRecord>>,
    stock: RwLock<Vec<StockSnapshot>>,
}

impl InMemoryStockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_subject(&self, subject_id: SubjectId, record: SubjectRecord) {
        self.subjects.write().expect("test double lock").insert(subject_id, record);
    }

    pub fn insert_stock(&self, snapshot: StockSnapshot) {
        self.stock.write().expect("test double lock").push(snapshot);
    }
}

#[async_trait]
impl StockCatalog for InMemoryStockCatalog {
    async fn snapshot(&self) -> Result<Vec<StockSnapshot>, SourceError> {
        Ok(self.stock.read().map_err(|_| poisoned("stock catalog"))?.clone())
    }

    async fn subject(&self, subject_id: SubjectId) -> Result<Option<SubjectRecord>, SourceError> {
        Ok(self
            .subjects
            .read()
            .map_err(|_| poisoned("stock catalog"))?
            .get(&subject_id)
            .cloned())
    }
}

/// In-memory asset directory, keyed by carrier tag.
#[derive(Debug, Default)]
pub struct InMemoryAssetDirectory {
    assets: RwLock<HashMap<String, AssetMeta>>,
}

impl InMemoryAssetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, carrier_tag: impl Into<String>, meta: AssetMeta) {
        self.assets.write().expect("test double lock").insert(carrier_tag.into(), meta);
    }
}

#[async_trait]
impl AssetDirectory for InMemoryAssetDirectory {
    async fn lookup(&self, carrier_tag: &str) -> Result<Option<AssetMeta>, SourceError> {
        Ok(self
            .assets
            .read()
            .map_err(|_| poisoned("asset directory"))?
            .get(carrier_tag)
            .cloned())
    }
}
