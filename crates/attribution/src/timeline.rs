//! Assignment timeline reconstruction.
//!
//! A pure fold over a subject's pre-sorted event stream: no I/O, no interior
//! mutation of shared state, trivially replayable. The caller decides what to
//! do with skipped events (the infra service logs them).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use arcops_core::{CarrierId, SubjectId};
use arcops_events::{AssignmentEvent, AssignmentEventKind};

/// A time span during which a subject was attached to one carrier.
///
/// For a given subject, intervals are non-overlapping and sorted ascending
/// by `start`. `end` is `None` only for the most recent interval (still
/// open); attribution treats an open end as "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentInterval {
    pub subject_id: SubjectId,
    pub carrier_id: CarrierId,
    pub carrier_label: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// True when synthesized from a catalog fact instead of derived from the
    /// audit log. Downstream consumers treat synthetic intervals with lower
    /// confidence.
    pub synthetic: bool,
}

impl AssignmentInterval {
    /// The effective end for attribution purposes.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end.unwrap_or(now)
    }
}

/// The catalog's materialized "current assignment" fact, used as a
/// best-effort fallback for subjects predating the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentAssignment {
    pub carrier_id: CarrierId,
    pub carrier_label: String,
    /// When the catalog record was created; anchors the synthetic lookback.
    pub recorded_at: DateTime<Utc>,
}

/// Reconstruction policy knobs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReconstructPolicy {
    /// How far before the catalog record's creation a synthetic interval
    /// reaches back when the subject has no audit trail.
    pub lookback_days: u32,
}

impl Default for ReconstructPolicy {
    fn default() -> Self {
        Self { lookback_days: 30 }
    }
}

/// An event the fold refused to apply, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub event: AssignmentEvent,
    pub reason: &'static str,
}

/// Result of reconstructing one subject's timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconstruction {
    pub intervals: Vec<AssignmentInterval>,
    pub skipped: Vec<SkippedEvent>,
}

struct OpenInterval {
    carrier_id: CarrierId,
    carrier_label: String,
    start: DateTime<Utc>,
}

/// Reconstruct non-overlapping assignment intervals from an ordered event
/// stream.
///
/// Malformed events (out of order relative to the open interval, or naming
/// no carrier where one is required) are skipped and reported, not fatal:
/// partial correctness beats total failure for a reporting feature.
pub fn reconstruct(
    subject_id: SubjectId,
    events: &[AssignmentEvent],
    current: Option<&CurrentAssignment>,
    policy: ReconstructPolicy,
    now: DateTime<Utc>,
) -> Reconstruction {
    let mut intervals = Vec::new();
    let mut skipped = Vec::new();
    let mut open: Option<OpenInterval> = None;
    // End of the most recently closed interval. An event earlier than this
    // (or than the open interval's start) would reopen time that is already
    // covered, so it is out of order even when nothing is open.
    let mut last_end: Option<DateTime<Utc>> = None;

    let close = |o: OpenInterval, end: DateTime<Utc>, intervals: &mut Vec<AssignmentInterval>| {
        intervals.push(AssignmentInterval {
            subject_id,
            carrier_id: o.carrier_id,
            carrier_label: o.carrier_label,
            start: o.start,
            end: Some(end),
            synthetic: false,
        });
    };

    for event in events {
        let floor = open.as_ref().map(|o| o.start).or(last_end);
        if let Some(floor) = floor {
            if event.occurred_at < floor {
                skipped.push(SkippedEvent {
                    event: event.clone(),
                    reason: "event predates the reconstructed timeline",
                });
                continue;
            }
        }

        match event.kind {
            AssignmentEventKind::Assigned | AssignmentEventKind::Transferred => {
                let Some(carrier_id) = event.carrier_id else {
                    skipped.push(SkippedEvent {
                        event: event.clone(),
                        reason: "assignment names no carrier",
                    });
                    continue;
                };
                let label = event.carrier_label.clone().unwrap_or_default();

                match &open {
                    // Re-assignment to the same carrier is a no-op.
                    Some(o) if o.carrier_id == carrier_id => {}
                    Some(_) => {
                        let o = open.take().expect("checked above");
                        close(o, event.occurred_at, &mut intervals);
                        last_end = Some(event.occurred_at);
                        open = Some(OpenInterval {
                            carrier_id,
                            carrier_label: label,
                            start: event.occurred_at,
                        });
                    }
                    None => {
                        open = Some(OpenInterval {
                            carrier_id,
                            carrier_label: label,
                            start: event.occurred_at,
                        });
                    }
                }
            }
            AssignmentEventKind::Unassigned => {
                // Unassign with nothing open is a no-op, not malformed.
                if let Some(o) = open.take() {
                    close(o, event.occurred_at, &mut intervals);
                    last_end = Some(event.occurred_at);
                }
            }
        }
    }

    if let Some(o) = open {
        intervals.push(AssignmentInterval {
            subject_id,
            carrier_id: o.carrier_id,
            carrier_label: o.carrier_label,
            start: o.start,
            end: None,
            synthetic: false,
        });
    } else if intervals.is_empty() {
        // Best-effort fallback for subjects predating the audit log: trust
        // the catalog's current-assignment fact over a bounded lookback.
        if let Some(current) = current {
            let start = current.recorded_at - Duration::days(i64::from(policy.lookback_days));
            intervals.push(AssignmentInterval {
                subject_id,
                carrier_id: current.carrier_id,
                carrier_label: current.carrier_label.clone(),
                start: start.min(now),
                end: None,
                synthetic: true,
            });
        }
    }

    Reconstruction { intervals, skipped }
}
