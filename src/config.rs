use std::collections::HashMap;
use std::path::PathBuf;

pub const EXPORT_BASE: &str = "https://exports.hotel-insights.dev/v1";

/// Time-to-live for memoized endpoint responses. Expiry is evaluated at
/// read time; there is no background eviction.
pub const RESPONSE_CACHE_TTL_HOURS: i64 = 24;

pub fn parquet_files() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        // Reservation/revenue facts, SCD2-versioned by business date
        ("insights", "parquet/insights.parquet"),
        // Physical room capacity per room type, SCD2-versioned
        ("room_type_details", "parquet/roomTypeDetails.parquet"),
        // Budgeted figures by occupancy date
        ("budget", "parquet/budget.parquet"),
    ])
}

pub fn json_files() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("manifest", "Manifest.json"),
        ("properties", "Properties.json.gz"),
    ])
}

/// Dimension fields the distribution endpoints may group by.
pub fn dimension_fields() -> Vec<&'static str> {
    vec![
        "guest_country",
        "producer",
        "market_segment",
        "booking_channel",
        "room_type",
    ]
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("hotel-insights-sdk")
    } else {
        PathBuf::from(".hotel-insights-cache")
    }
}
