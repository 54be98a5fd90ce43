//! Stock reorder prioritization.

use serde::{Deserialize, Serialize};

use arcops_core::StockItemId;

/// Sentinel for "consumption is zero, stockout is indeterminate" — not
/// "never runs out".
pub const STOCKOUT_INDETERMINATE: u32 = 999;

/// Reorder urgency, declared in severity order so `Ord` sorts Critical
/// first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderPriority {
    Critical,
    High,
    Medium,
    Low,
}

/// A catalog snapshot row for one stocked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub item_id: StockItemId,
    pub name: String,
    pub quantity: i64,
    pub reorder_point: i64,
    pub cost_per_unit: f64,
    /// Turnover-rate proxy (units moved per period); drives the stockout
    /// estimate.
    pub turnover_signal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub item_id: StockItemId,
    pub name: String,
    pub current_quantity: i64,
    pub reorder_point: i64,
    pub suggested_quantity: i64,
    pub estimated_cost: f64,
    pub priority: ReorderPriority,
    pub estimated_days_until_stockout: u32,
}

/// Classify urgency from quantity vs. reorder threshold.
pub fn classify(quantity: i64, reorder_point: i64) -> ReorderPriority {
    if quantity <= 0 || quantity * 2 <= reorder_point {
        ReorderPriority::Critical
    } else if quantity <= reorder_point {
        ReorderPriority::High
    } else if quantity * 2 <= reorder_point * 3 {
        ReorderPriority::Medium
    } else {
        ReorderPriority::Low
    }
}

fn days_until_stockout(quantity: i64, turnover_signal: f64) -> u32 {
    if turnover_signal <= 0.0 || quantity <= 0 {
        return if quantity <= 0 { 0 } else { STOCKOUT_INDETERMINATE };
    }
    let days = (quantity as f64 / (turnover_signal * 10.0)).round();
    (days as u32).min(STOCKOUT_INDETERMINATE)
}

fn recommend(snapshot: &StockSnapshot) -> ReorderRecommendation {
    // The order always at least restores the threshold.
    let suggested_quantity =
        (snapshot.reorder_point * 2 - snapshot.quantity).max(snapshot.reorder_point);
    ReorderRecommendation {
        item_id: snapshot.item_id,
        name: snapshot.name.clone(),
        current_quantity: snapshot.quantity,
        reorder_point: snapshot.reorder_point,
        suggested_quantity,
        estimated_cost: suggested_quantity as f64 * snapshot.cost_per_unit,
        priority: classify(snapshot.quantity, snapshot.reorder_point),
        estimated_days_until_stockout: days_until_stockout(
            snapshot.quantity,
            snapshot.turnover_signal,
        ),
    }
}

/// Build reorder recommendations, most urgent first.
///
/// `Low`-priority items are excluded unless explicitly requested, keeping
/// the default output focused on actionable stock.
pub fn prioritize(snapshots: &[StockSnapshot], include_low: bool) -> Vec<ReorderRecommendation> {
    let mut recommendations: Vec<_> = snapshots
        .iter()
        .map(recommend)
        .filter(|r| include_low || r.priority != ReorderPriority::Low)
        .collect();
    recommendations.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.estimated_days_until_stockout.cmp(&b.estimated_days_until_stockout))
    });
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(quantity: i64, reorder_point: i64, turnover: f64) -> StockSnapshot {
        StockSnapshot {
            item_id: StockItemId::new(),
            name: "Plush Bear".to_string(),
            quantity,
            reorder_point,
            cost_per_unit: 4.5,
            turnover_signal: turnover,
        }
    }

    #[test]
    fn empty_stock_is_critical_with_restoring_order() {
        let recs = prioritize(&[snapshot(0, 10, 1.0)], false);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, ReorderPriority::Critical);
        assert_eq!(recs[0].suggested_quantity, 20);
        assert_eq!(recs[0].estimated_cost, 90.0);
        assert_eq!(recs[0].estimated_days_until_stockout, 0);
    }

    #[test]
    fn classification_bands() {
        assert_eq!(classify(0, 10), ReorderPriority::Critical);
        assert_eq!(classify(5, 10), ReorderPriority::Critical); // <= 0.5x
        assert_eq!(classify(6, 10), ReorderPriority::High);
        assert_eq!(classify(10, 10), ReorderPriority::High); // at threshold
        assert_eq!(classify(15, 10), ReorderPriority::Medium); // <= 1.5x
        assert_eq!(classify(16, 10), ReorderPriority::Low);
    }

    #[test]
    fn suggested_quantity_at_least_restores_threshold() {
        // 2*rp - qty would be 2*10 - 15 = 5; floor at rp = 10.
        let recs = prioritize(&[snapshot(15, 10, 1.0)], false);
        assert_eq!(recs[0].suggested_quantity, 10);
    }

    #[test]
    fn zero_consumption_means_indeterminate_not_never() {
        let recs = prioritize(&[snapshot(8, 10, 0.0)], false);
        assert_eq!(recs[0].estimated_days_until_stockout, STOCKOUT_INDETERMINATE);
    }

    #[test]
    fn stockout_estimate_tracks_turnover() {
        let recs = prioritize(&[snapshot(8, 10, 0.2)], false);
        // 8 / (0.2 * 10) = 4 days.
        assert_eq!(recs[0].estimated_days_until_stockout, 4);
    }

    #[test]
    fn output_sorted_critical_first() {
        let recs = prioritize(
            &[snapshot(15, 10, 1.0), snapshot(0, 10, 1.0), snapshot(8, 10, 1.0)],
            false,
        );
        let priorities: Vec<_> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![ReorderPriority::Critical, ReorderPriority::High, ReorderPriority::Medium]
        );
    }

    #[test]
    fn low_priority_excluded_unless_requested() {
        let snapshots = vec![snapshot(100, 10, 1.0)];
        assert!(prioritize(&snapshots, false).is_empty());
        let with_low = prioritize(&snapshots, true);
        assert_eq!(with_low.len(), 1);
        assert_eq!(with_low[0].priority, ReorderPriority::Low);
    }
}
