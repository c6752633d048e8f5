use serde::{Deserialize, Serialize};

use crate::align::SeriesPoint;

// ---------------------------------------------------------------------------
// KpiCard — one headline metric with its comparison and daily series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCard {
    pub value: f64,
    /// `None` when the comparison was suppressed (`NoComparison`); a zero
    /// prior value reads as `Some(0.0)` per the crate-wide change policy.
    pub percentage_change: Option<f64>,
    pub fluctuation: Vec<SeriesPoint>,
}

// ---------------------------------------------------------------------------
// KpiReport — the overview endpoint payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    pub total_revenue: KpiCard,
    pub rooms_sold: KpiCard,
    pub adr: KpiCard,
    pub occupancy_rate: KpiCard,
    pub room_revenue: KpiCard,
    pub fb_revenue: KpiCard,
    pub other_revenue: KpiCard,
    pub revpar: KpiCard,
    pub trevpar: KpiCard,
    /// Daily physical-room capacity as of the business date.
    pub hotel_capacity: f64,
}
