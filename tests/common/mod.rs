//! Shared test fixtures for the insights SDK integration tests.
//!
//! Provides `setup_sample_db()` which creates an in-memory DuckDB connection
//! populated with small sample tables (insights, room_type_details, budget)
//! via NDJSON temp files, plus an in-memory response cache.
//!
//! The sample facts cover two comparable periods: early June 2024 (the
//! "current" side for a 2024-06-05 business date) and early June 2023 (the
//! last-year baseline), with booking dates arranged for pickup tests.

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use hotel_insights_sdk::{Connection, MemoryStore, ResponseCache, SnapshotStore};
use tempfile::NamedTempFile;

/// Create a `Connection` backed by a temporary cache directory with sample
/// data loaded into DuckDB tables via NDJSON temp files.
///
/// Returns `(Connection, tempfile::TempDir)`. The caller must keep the
/// `TempDir` alive for the duration of the test so the cache directory is
/// not deleted prematurely.
pub fn setup_sample_db() -> (Connection, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let snapshots = SnapshotStore::new(
        Some(tmp_dir.path().to_path_buf()),
        true,
        Duration::from_secs(30),
    )
    .unwrap();
    let conn = Connection::new(snapshots).unwrap();

    // -- insights facts -------------------------------------------------------
    register_insights(&conn);

    // -- room capacity (SCD2-versioned) ---------------------------------------
    register_room_type_details(&conn);

    // -- budget figures -------------------------------------------------------
    register_budget(&conn);

    (conn, tmp_dir)
}

/// A response cache over a fresh in-memory store, real clock.
pub fn memory_cache() -> ResponseCache {
    ResponseCache::new(Box::new(MemoryStore::new()))
}

fn register_insights(conn: &Connection) {
    let rows = vec![
        // -- current period stays (occupancy 2024-06-01..03, property "coast")
        insights_row("coast", "2024-06-01", "2024-05-20", "Germany", "10", 10.0, 1000.0, 200.0, 100.0, 1300.0, 0.0, 0.0),
        insights_row("coast", "2024-06-02", "2024-05-22", "Germany", "10", 20.0, 2000.0, 0.0, 0.0, 2000.0, 0.0, 0.0),
        insights_row("coast", "2024-06-02", "2024-05-25", "United Kingdom", "11", 5.0, 750.0, 50.0, 0.0, 800.0, 0.0, 0.0),
        insights_row("coast", "2024-06-03", "2024-05-28", "Croatia", "12", 8.0, 800.0, 0.0, 200.0, 1000.0, 0.0, 0.0),
        // Warehouse junk marker; distribution must filter it, KPI totals keep it
        insights_row("coast", "2024-06-03", "2024-05-28", "UNDEFINED", "-1", 1.0, 100.0, 0.0, 0.0, 100.0, 0.0, 0.0),
        // Another property, for the property filter
        insights_row("city", "2024-06-02", "2024-05-21", "Germany", "13", 100.0, 10000.0, 0.0, 0.0, 10000.0, 0.0, 0.0),
        // -- last-year baseline (occupancy 2023-06-01..03)
        insights_row("coast", "2023-06-01", "2023-05-18", "Germany", "10", 8.0, 800.0, 100.0, 0.0, 900.0, 0.0, 0.0),
        insights_row("coast", "2023-06-02", "2023-05-20", "Germany", "10", 10.0, 1000.0, 0.0, 0.0, 1000.0, 0.0, 0.0),
        insights_row("coast", "2023-06-03", "2023-05-25", "Croatia", "12", 4.0, 300.0, 0.0, 0.0, 300.0, 0.0, 0.0),
        // -- pickup bookings (occupancy later in June 2024, outside the KPI windows)
        insights_row("coast", "2024-06-10", "2024-06-05", "Germany", "10", 3.0, 450.0, 0.0, 0.0, 450.0, 1.0, 100.0),
        insights_row("coast", "2024-06-12", "2024-06-04", "Germany", "10", 2.0, 300.0, 0.0, 0.0, 300.0, 0.0, 0.0),
        insights_row("coast", "2024-06-15", "2024-06-01", "Croatia", "12", 4.0, 400.0, 0.0, 0.0, 400.0, 0.0, 0.0),
        insights_row("coast", "2024-06-20", "2024-06-02", "Croatia", "12", 6.0, 600.0, 0.0, 0.0, 600.0, 2.0, 250.0),
    ];

    write_ndjson_and_register(conn, "insights", &rows);
    normalize_dates(
        conn,
        "insights",
        &["occupancy_date", "booking_date", "scd_valid_from", "scd_valid_to"],
    );
}

fn register_room_type_details(conn: &Connection) {
    let rows = vec![
        // Capacity grew from 40 to 50 standard rooms on 2024-01-01; prior
        // as-of lookups must see the old snapshot.
        serde_json::json!({
            "property": "coast",
            "room_type": "STD",
            "physical_rooms": 50,
            "scd_valid_from": "2024-01-01",
            "scd_valid_to": "9999-12-31"
        }),
        serde_json::json!({
            "property": "coast",
            "room_type": "STD",
            "physical_rooms": 40,
            "scd_valid_from": "2020-01-01",
            "scd_valid_to": "2024-01-01"
        }),
        serde_json::json!({
            "property": "coast",
            "room_type": "DLX",
            "physical_rooms": 30,
            "scd_valid_from": "2020-01-01",
            "scd_valid_to": "9999-12-31"
        }),
        serde_json::json!({
            "property": "city",
            "room_type": "STD",
            "physical_rooms": 20,
            "scd_valid_from": "2020-01-01",
            "scd_valid_to": "9999-12-31"
        }),
    ];

    write_ndjson_and_register(conn, "room_type_details", &rows);
    normalize_dates(conn, "room_type_details", &["scd_valid_from", "scd_valid_to"]);
}

fn register_budget(conn: &Connection) {
    let rows = vec![
        serde_json::json!({
            "property": "coast",
            "occupancy_date": "2023-06-01",
            "rooms_sold": 12,
            "room_revenue": 1200.0,
            "fb_revenue": 100.0,
            "other_revenue": 0.0,
            "total_revenue": 1300.0
        }),
        serde_json::json!({
            "property": "coast",
            "occupancy_date": "2023-06-02",
            "rooms_sold": 15,
            "room_revenue": 1500.0,
            "fb_revenue": 0.0,
            "other_revenue": 0.0,
            "total_revenue": 1500.0
        }),
    ];

    write_ndjson_and_register(conn, "budget", &rows);
    normalize_dates(conn, "budget", &["occupancy_date"]);
}

#[allow(clippy::too_many_arguments)]
fn insights_row(
    property: &str,
    occupancy_date: &str,
    booking_date: &str,
    guest_country: &str,
    producer: &str,
    rooms_sold: f64,
    room_revenue: f64,
    fb_revenue: f64,
    other_revenue: f64,
    total_revenue: f64,
    cancelled_rooms: f64,
    revenue_lost: f64,
) -> serde_json::Value {
    serde_json::json!({
        "property": property,
        "occupancy_date": occupancy_date,
        "booking_date": booking_date,
        "guest_country": guest_country,
        "producer": producer,
        "market_segment": "Leisure",
        "booking_channel": "Direct",
        "room_type": "STD",
        "rooms_sold": rooms_sold,
        "room_revenue": room_revenue,
        "fb_revenue": fb_revenue,
        "other_revenue": other_revenue,
        "total_revenue": total_revenue,
        "cancelled_rooms": cancelled_rooms,
        "revenue_lost": revenue_lost,
        "scd_valid_from": "2020-01-01",
        "scd_valid_to": "9999-12-31"
    })
}

/// Write a slice of JSON values as NDJSON to a temp file and register it
/// as a DuckDB table via `Connection::register_table_from_ndjson`.
fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
    // NamedTempFile is dropped here, but DuckDB has already read the data
}

/// Force the calendar columns to DATE regardless of what read_json_auto
/// inferred, matching what view registration does for parquet exports.
fn normalize_dates(conn: &Connection, table: &str, cols: &[&str]) {
    let replace = cols
        .iter()
        .map(|c| format!("TRY_CAST(\"{}\" AS DATE) AS \"{}\"", c, c))
        .collect::<Vec<_>>()
        .join(", ");
    conn.raw()
        .execute_batch(&format!(
            "CREATE TABLE {t}_norm AS SELECT * REPLACE ({r}) FROM {t}; \
             DROP TABLE {t}; \
             ALTER TABLE {t}_norm RENAME TO {t};",
            t = table,
            r = replace
        ))
        .unwrap();
}
