use serde::{Deserialize, Serialize};

/// One pickup KPI card: how much booked on the report date vs the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupKpi {
    pub kpi_name: String,
    pub title: String,
    pub current_value: f64,
    /// For `LastNDays` baselines this is a per-day average.
    pub comparison_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupReport {
    pub kpis: Vec<PickupKpi>,
    /// Distinct booking days that actually contributed to the baseline
    /// average (the requested N when the prior sample was empty).
    pub comparison_days: u32,
}
