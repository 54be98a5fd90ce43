//! Attributed-revenue queries for one subject.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::warn;

use arcops_attribution::{
    clip_intervals, reconstruct, summarize, AttributedRevenue, ReconstructPolicy,
};
use arcops_core::{CarrierId, DateRange, DomainError, SubjectId};

use crate::services::MAX_CONCURRENT_FETCHES;
use crate::sources::{EventLogSource, ReadingStore, SourceError, StockCatalog};

#[derive(Debug, Error)]
pub enum AttributionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Neither the audit log nor the catalog knows the subject.
    #[error("unknown subject {0}")]
    UnknownSubject(SubjectId),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Every reading fetch for the query failed; there is nothing left to
    /// degrade to.
    #[error("all reading fetches failed")]
    AllSourcesFailed,
}

/// Reconstructs a subject's assignment timeline from the audit log and
/// attributes metered revenue to the carriers it passed through.
///
/// Holds no state between calls; every query replays the subject's event
/// stream against a fresh view of the stores.
pub struct AttributionService<L, R, C> {
    event_log: L,
    readings: R,
    catalog: C,
    policy: ReconstructPolicy,
}

impl<L, R, C> AttributionService<L, R, C>
where
    L: EventLogSource,
    R: ReadingStore,
    C: StockCatalog,
{
    pub fn new(event_log: L, readings: R, catalog: C) -> Self {
        Self {
            event_log,
            readings,
            catalog,
            policy: ReconstructPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconstructPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attributed revenue for `subject_id` over `range` (or the subject's
    /// whole assignment history when `None`), optionally narrowed to one
    /// carrier.
    pub async fn calculate(
        &self,
        subject_id: SubjectId,
        range: Option<DateRange>,
        carrier: Option<CarrierId>,
    ) -> Result<AttributedRevenue, AttributionError> {
        self.calculate_at(subject_id, range, carrier, Utc::now()).await
    }

    /// [`Self::calculate`] with an explicit "now", for tests and replays.
    pub async fn calculate_at(
        &self,
        subject_id: SubjectId,
        range: Option<DateRange>,
        carrier: Option<CarrierId>,
        now: DateTime<Utc>,
    ) -> Result<AttributedRevenue, AttributionError> {
        let events = match self.event_log.events(subject_id).await {
            Ok(events) => events,
            Err(error) => {
                warn!(%subject_id, %error, "event log unavailable, falling back to the catalog fact");
                Vec::new()
            }
        };

        let current = match self.catalog.subject(subject_id).await {
            Ok(Some(record)) => record.current_assignment,
            Ok(None) if events.is_empty() => {
                return Err(AttributionError::UnknownSubject(subject_id));
            }
            Ok(None) => None,
            Err(error) if events.is_empty() => return Err(error.into()),
            Err(error) => {
                warn!(%subject_id, %error, "catalog unavailable, continuing from the audit log alone");
                None
            }
        };

        let reconstruction = reconstruct(subject_id, &events, current.as_ref(), self.policy, now);
        for skipped in &reconstruction.skipped {
            warn!(
                %subject_id,
                event_type = skipped.event.kind.event_type(),
                reason = skipped.reason,
                occurred_at = %skipped.event.occurred_at,
                "skipping malformed assignment event"
            );
        }

        let mut intervals = reconstruction.intervals;
        if let Some(carrier) = carrier {
            intervals.retain(|interval| interval.carrier_id == carrier);
        }

        let Some(first_start) = intervals.iter().map(|i| i.start.date_naive()).min() else {
            return Ok(AttributedRevenue::empty(subject_id));
        };
        let range = match range {
            Some(range) => range,
            // Whole history: from the earliest assignment through today.
            None => DateRange::new(first_start, now.date_naive() + Duration::days(1))?,
        };

        let clipped = clip_intervals(&intervals, range, now);
        if clipped.is_empty() {
            return Ok(AttributedRevenue::empty(subject_id));
        }

        let store = &self.readings;
        let fetches = clipped.into_iter().map(|interval| async move {
            let (start, end) = interval.day_span();
            let result = store.readings(interval.carrier_id, start, end).await;
            (interval, result)
        });
        let fetched: Vec<_> = stream::iter(fetches)
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        let total = fetched.len();
        let mut failures = 0usize;
        let parts: Vec<_> = fetched
            .into_iter()
            .map(|(interval, result)| match result {
                Ok(readings) => (interval, readings),
                Err(error) => {
                    failures += 1;
                    warn!(
                        %subject_id,
                        carrier_id = %interval.carrier_id,
                        %error,
                        "reading fetch failed, this period contributes zero"
                    );
                    (interval, Vec::new())
                }
            })
            .collect();
        if failures == total {
            return Err(AttributionError::AllSourcesFailed);
        }

        Ok(summarize(subject_id, parts))
    }
}
