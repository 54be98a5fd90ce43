use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use arcops_core::{CarrierId, SubjectId};

/// The closed set of assignment event kinds.
///
/// Everything the reconstructor does is driven by these three kinds; legacy
/// free-text actions are mapped onto them once, at the ingestion boundary
/// (see [`crate::normalize`]), never re-guessed per call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentEventKind {
    /// The subject was attached to a carrier.
    Assigned,
    /// The subject was detached from its current carrier.
    Unassigned,
    /// The subject moved from its current carrier to another in one step.
    Transferred,
}

impl AssignmentEventKind {
    /// Stable event name/type identifier, for logs and serialized payloads.
    pub fn event_type(&self) -> &'static str {
        match self {
            AssignmentEventKind::Assigned => "assignment.assigned",
            AssignmentEventKind::Unassigned => "assignment.unassigned",
            AssignmentEventKind::Transferred => "assignment.transferred",
        }
    }
}

/// One change event for a subject's carrier assignment.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - strictly ordered by `occurred_at` within a subject's stream
/// - designed to be **append-only**
///
/// `carrier_id`/`carrier_label` name the destination carrier and are present
/// for `Assigned` and `Transferred`; an `Unassigned` event carries neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub subject_id: SubjectId,
    pub kind: AssignmentEventKind,
    pub carrier_id: Option<CarrierId>,
    pub carrier_label: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AssignmentEvent {
    pub fn assigned(
        subject_id: SubjectId,
        carrier_id: CarrierId,
        carrier_label: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            kind: AssignmentEventKind::Assigned,
            carrier_id: Some(carrier_id),
            carrier_label: Some(carrier_label.into()),
            occurred_at,
        }
    }

    pub fn unassigned(subject_id: SubjectId, occurred_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            kind: AssignmentEventKind::Unassigned,
            carrier_id: None,
            carrier_label: None,
            occurred_at,
        }
    }

    pub fn transferred(
        subject_id: SubjectId,
        to_carrier: CarrierId,
        carrier_label: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            kind: AssignmentEventKind::Transferred,
            carrier_id: Some(to_carrier),
            carrier_label: Some(carrier_label.into()),
            occurred_at,
        }
    }

    /// Whether this event names a destination carrier.
    ///
    /// `Assigned`/`Transferred` events without one are malformed and get
    /// skipped by the reconstructor.
    pub fn names_carrier(&self) -> bool {
        self.carrier_id.is_some()
    }
}
