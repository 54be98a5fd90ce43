//! `arcops-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the query date range, and the domain error model.

pub mod error;
pub mod id;
pub mod range;

pub use error::{DomainError, DomainResult};
pub use id::{CarrierId, StockItemId, SubjectId};
pub use range::DateRange;
