use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use arcops_core::CarrierId;

/// One metered reading for a carrier on a calendar day.
///
/// Owned by the reading store; one row per carrier per day, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub carrier_id: CarrierId,
    pub date: NaiveDate,
    pub revenue: f64,
    pub play_count: u64,
}
