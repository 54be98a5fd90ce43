//! `arcops-events` — the assignment event vocabulary.
//!
//! The audit trail is produced externally and is append-only; this crate
//! defines the closed set of event kinds the reconstructor understands and
//! the normalization table that maps legacy free-text audit actions onto it.

pub mod event;
pub mod normalize;

pub use event::{AssignmentEvent, AssignmentEventKind};
pub use normalize::{normalize_action, LegacyAuditRecord, NormalizeError};
