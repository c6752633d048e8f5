//! Query modules for the insights SDK.
//!
//! Each module provides a query struct that borrows a
//! [`Connection`](crate::connection::Connection) and the shared
//! [`ResponseCache`](crate::response_cache::ResponseCache), and follows the
//! same control flow: consult the cache, resolve the current and prior
//! windows, query both periods, align and join, memoize the result.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

pub mod distribution;
pub mod kpis;
pub mod pickup;

pub use distribution::{DistributionParams, DistributionQuery};
pub use kpis::{KpiParams, KpiQuery};
pub use pickup::{PickupParams, PickupQuery};

/// Bucket granularity of a report's chart series: daily points for Day and
/// Month periods, monthly points once the window spans a year.
pub(crate) fn chart_granularity(period: crate::period::Granularity) -> crate::period::Granularity {
    match period {
        crate::period::Granularity::Year => crate::period::Granularity::Month,
        _ => crate::period::Granularity::Day,
    }
}

/// Read a numeric column off a row, treating absent/NULL as zero.
pub(crate) fn metric(row: &HashMap<String, Value>, name: &str) -> f64 {
    row.get(name).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Parse a `strftime`-formatted bucket column back to a date.
pub(crate) fn parse_bucket(row: &HashMap<String, Value>, name: &str) -> Option<NaiveDate> {
    row.get(name)?.as_str()?.parse().ok()
}

/// Presentation rounding: whole units above 100, cents below.
pub(crate) fn round_metric(value: f64) -> f64 {
    if value >= 100.0 {
        value.round()
    } else {
        (value * 100.0).round() / 100.0
    }
}
