//! Request-scoped services over the collaborator boundaries.
//!
//! Degraded-source policy: a failed sibling fetch contributes zero and is
//! logged; the enclosing call fails only when every fetch for the query
//! failed. Malformed caller input (bad range, unknown subject) is surfaced
//! instead.

pub mod analytics;
pub mod attribution;

/// Cap on concurrently in-flight fetches within one call. Fan-out streams
/// through a fixed-size buffer so a long query range cannot translate into
/// an unbounded burst against the backing sources.
pub(crate) const MAX_CONCURRENT_FETCHES: usize = 8;

pub use analytics::{AnalyticsError, AnalyticsService};
pub use attribution::{AttributionError, AttributionService};
