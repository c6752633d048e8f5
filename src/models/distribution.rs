use serde::{Deserialize, Serialize};

use crate::align::SeriesPoint;

/// One metric of a category slice: totals for both periods, the relative
/// change, and the aligned daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSplit {
    pub current: f64,
    pub previous: f64,
    /// `None` when the comparison was suppressed.
    pub change: Option<f64>,
    pub series: Vec<SeriesPoint>,
}

/// One top-N category of a dimension field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSlice {
    pub name: String,
    /// Stable presentation code (ISO country code or slug).
    pub code: String,
    pub revenue: MetricSplit,
    pub rooms_sold: MetricSplit,
    pub adr: MetricSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    /// The dimension field the slices are grouped by.
    pub field: String,
    pub slices: Vec<DistributionSlice>,
}
