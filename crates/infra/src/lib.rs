//! Infrastructure layer: external collaborator boundaries, in-memory
//! doubles, and the request-scoped services that orchestrate them.
//!
//! The services hold no mutable state between calls; every query reads a
//! fresh view of the sources, and all sibling fetches within one call are
//! issued concurrently under a fixed bound and joined (never raced) before
//! results are merged and sorted.

pub mod in_memory;
pub mod services;
pub mod sources;


pub use services::{AnalyticsError, AnalyticsService, AttributionError, AttributionService};
pub use sources::{
    AssetDirectory, EventLogSource, MachineFeed, ReadingStore, SalesFeed, SourceError,
    StockCatalog, SubjectRecord,
};
