//! `arcops-attribution` — assignment timeline reconstruction and
//! interval-based revenue attribution.
//!
//! Everything here is a pure function over pre-fetched data; the
//! concurrent fetching lives in `arcops-infra`.

pub mod attribute;
pub mod reading;
pub mod timeline;

pub use attribute::{attribute, clip_intervals, summarize, AttributedRevenue, CarrierPeriod, ClippedInterval};
pub use reading::DailyReading;
pub use timeline::{
    reconstruct, AssignmentInterval, CurrentAssignment, ReconstructPolicy, Reconstruction,
    SkippedEvent,
};
