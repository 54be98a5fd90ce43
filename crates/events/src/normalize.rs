//! Normalization of legacy free-text audit actions.
//!
//! Older audit rows carry actions like `"Assigned to machine"`, `"Stock
//! transfer"` or `"Removed from slot"` with loosely-typed detail payloads.
//! This module maps them onto [`AssignmentEventKind`] with one explicit,
//! ordered rule table, validated at the ingestion boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use arcops_core::{CarrierId, SubjectId};

use crate::event::{AssignmentEvent, AssignmentEventKind};

/// A raw audit row as the legacy log stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAuditRecord {
    pub subject_id: SubjectId,
    pub action: String,
    /// Destination carrier, when the action names one. Legacy rows used
    /// several field names for this; the log source resolves them before
    /// handing the record over.
    pub carrier_id: Option<CarrierId>,
    pub carrier_label: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The action matched no rule in the table.
    #[error("unrecognized audit action: {0:?}")]
    UnrecognizedAction(String),

    /// The action implies a destination carrier but the record names none.
    #[error("action {0:?} requires a carrier")]
    MissingCarrier(String),
}

/// Rule table, checked in order. First match wins.
///
/// `transfer` is checked before `assign` because legacy transfer actions
/// often contain both words ("transferred assignment").
const RULES: &[(&[&str], AssignmentEventKind)] = &[
    (&["transfer"], AssignmentEventKind::Transferred),
    (&["unassign", "removed"], AssignmentEventKind::Unassigned),
    (&["assign", "using"], AssignmentEventKind::Assigned),
];

/// Map a legacy action string to an event kind.
pub fn normalize_action(action: &str) -> Result<AssignmentEventKind, NormalizeError> {
    let lowered = action.to_lowercase();
    for (needles, kind) in RULES {
        if needles.iter().any(|n| lowered.contains(n)) {
            return Ok(*kind);
        }
    }
    Err(NormalizeError::UnrecognizedAction(action.to_string()))
}

impl LegacyAuditRecord {
    /// Normalize into a typed assignment event.
    ///
    /// Rejects records whose action requires a carrier but that name none;
    /// callers skip those with a log entry rather than aborting the stream.
    pub fn normalize(&self) -> Result<AssignmentEvent, NormalizeError> {
        let kind = normalize_action(&self.action)?;
        match kind {
            AssignmentEventKind::Unassigned => {
                Ok(AssignmentEvent::unassigned(self.subject_id, self.occurred_at))
            }
            AssignmentEventKind::Assigned | AssignmentEventKind::Transferred => {
                let carrier_id = self
                    .carrier_id
                    .ok_or_else(|| NormalizeError::MissingCarrier(self.action.clone()))?;
                Ok(AssignmentEvent {
                    subject_id: self.subject_id,
                    kind,
                    carrier_id: Some(carrier_id),
                    carrier_label: self.carrier_label.clone(),
                    occurred_at: self.occurred_at,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(action: &str, carrier: Option<CarrierId>) -> LegacyAuditRecord {
        LegacyAuditRecord {
            subject_id: SubjectId::new(),
            action: action.to_string(),
            carrier_id: carrier,
            carrier_label: carrier.map(|_| "Claw Machine 1".to_string()),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn assign_variants_map_to_assigned() {
        for action in ["Assigned to machine", "Marked as Using", "assign"] {
            assert_eq!(
                normalize_action(action).unwrap(),
                AssignmentEventKind::Assigned,
                "{action}"
            );
        }
    }

    #[test]
    fn unassign_wins_over_assign_substring() {
        // "unassign" contains "assign"; the rule order must not misfile it.
        assert_eq!(
            normalize_action("Unassigned from machine").unwrap(),
            AssignmentEventKind::Unassigned
        );
        assert_eq!(
            normalize_action("Removed from slot").unwrap(),
            AssignmentEventKind::Unassigned
        );
    }

    #[test]
    fn transfer_wins_over_assign_substring() {
        assert_eq!(
            normalize_action("Transferred assignment to new machine").unwrap(),
            AssignmentEventKind::Transferred
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = normalize_action("Price updated").unwrap_err();
        assert!(matches!(err, NormalizeError::UnrecognizedAction(_)));
    }

    #[test]
    fn assigned_record_without_carrier_is_rejected() {
        let err = record("Assigned to machine", None).normalize().unwrap_err();
        assert!(matches!(err, NormalizeError::MissingCarrier(_)));
    }

    #[test]
    fn unassigned_record_needs_no_carrier() {
        let event = record("Unassigned", None).normalize().unwrap();
        assert_eq!(event.kind, AssignmentEventKind::Unassigned);
        assert!(event.carrier_id.is_none());
    }

    #[test]
    fn normalized_record_carries_destination() {
        let carrier = CarrierId::new();
        let event = record("Transfer to floor 2", Some(carrier)).normalize().unwrap();
        assert_eq!(event.kind, AssignmentEventKind::Transferred);
        assert_eq!(event.carrier_id, Some(carrier));
    }
}
