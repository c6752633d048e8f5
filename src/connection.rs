//! DuckDB connection wrapper with view registration and query execution.
//!
//! Uses schema introspection to adapt views dynamically: calendar columns
//! the export carries as VARCHAR or TIMESTAMP are cast to DATE at view
//! registration, so every query can compare and group on plain dates.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;
use crate::snapshot::SnapshotStore;

/// Columns that must read as DATE regardless of the physical type the
/// export wrote. Facts are SCD2-versioned, so the validity bounds are
/// calendar columns too.
fn date_columns() -> HashSet<&'static str> {
    HashSet::from([
        "occupancy_date",
        "booking_date",
        "cancellation_date",
        "scd_valid_from",
        "scd_valid_to",
    ])
}

/// Wraps a DuckDB connection and registers parquet exports as views.
pub struct Connection {
    conn: DuckDbConnection,
    /// The snapshot store used to download/locate data files.
    pub snapshots: RefCell<SnapshotStore>,
    registered_views: RefCell<HashSet<String>>,
}

impl Connection {
    /// Create a connection backed by the given snapshot store.
    ///
    /// Opens an in-memory DuckDB database.
    pub fn new(snapshots: SnapshotStore) -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            snapshots: RefCell::new(snapshots),
            registered_views: RefCell::new(HashSet::new()),
        })
    }

    /// Ensure one or more views are registered, downloading data if needed.
    pub fn ensure_views(&self, views: &[&str]) -> Result<()> {
        for name in views {
            if !self.registered_views.borrow().contains(*name) {
                self.ensure_view(name)?;
            }
        }
        Ok(())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Get column metadata AFTER query execution (calling before panics in duckdb-rs)
        let column_names: Vec<String> = rows_result
            .as_ref()
            .unwrap()
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let column_count = rows_result.as_ref().unwrap().column_count();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::new();
            for i in 0..column_count {
                let col_name = &column_names[i];
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    ///
    /// First executes the query as `HashMap` rows, then deserializes each
    /// row using `serde_json`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter()
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            let value = convert_value_ref(row.get_ref(0)?);
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    ///
    /// More memory-efficient than loading data into a Rust structure first,
    /// since data is streamed from disk by DuckDB.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = ndjson_path.replace('\\', "/");
        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; \
             CREATE TABLE {} AS SELECT * FROM read_json_auto('{}', format='newline_delimited')",
            table_name, table_name, path_fwd
        ))?;
        self.registered_views
            .borrow_mut()
            .insert(table_name.to_string());
        Ok(())
    }

    /// Check whether a view has been registered.
    pub fn has_view(&self, name: &str) -> bool {
        self.registered_views.borrow().contains(name)
    }

    /// Return a list of all registered view names.
    pub fn views(&self) -> Vec<String> {
        self.registered_views.borrow().iter().cloned().collect()
    }

    /// Clear all registered views so they will be re-created on next access.
    pub fn reset_views(&self) {
        self.registered_views.borrow_mut().clear();
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    /// Lazily register a parquet export as a DuckDB view.
    ///
    /// Introspects the parquet schema on first registration and builds the
    /// view SQL dynamically, so the SDK adapts to upstream export changes
    /// without code updates.
    fn ensure_view(&self, view_name: &str) -> Result<()> {
        if self.registered_views.borrow().contains(view_name) {
            return Ok(());
        }

        let path = self.snapshots.borrow_mut().ensure_parquet(view_name)?;
        // Use forward slashes for DuckDB compatibility
        let path_str = path.to_string_lossy().replace('\\', "/");

        let replace_clause = self.build_date_replace(&path_str)?;

        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE VIEW {} AS SELECT *{} FROM read_parquet('{}')",
            view_name, replace_clause, path_str
        ))?;
        self.registered_views
            .borrow_mut()
            .insert(view_name.to_string());
        debug!(view = view_name, path = %path_str, "registered view");

        Ok(())
    }

    /// Build a REPLACE clause normalizing calendar columns to DATE.
    ///
    /// Exports are not consistent about date physical types (some warehouse
    /// writers emit VARCHAR, some TIMESTAMP), so every known calendar column
    /// that is not already DATE gets a `TRY_CAST(.. AS DATE)`.
    ///
    /// Only reads the parquet footer (DESCRIBE) -- no data scanning needed.
    fn build_date_replace(&self, path_str: &str) -> Result<String> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT column_name, column_type FROM \
             (DESCRIBE SELECT * FROM read_parquet('{}'))",
            path_str
        ))?;

        let mut rows = stmt.query([])?;
        let mut schema: Vec<(String, String)> = Vec::new();

        while let Some(row) = rows.next()? {
            let col_name: String = row.get(0)?;
            let col_type: String = row.get(1)?;
            schema.push((col_name, col_type));
        }

        let known = date_columns();
        let mut exprs: Vec<String> = Vec::new();

        for (col, dtype) in &schema {
            if known.contains(col.as_str()) && dtype != "DATE" {
                exprs.push(format!("TRY_CAST(\"{}\" AS DATE) AS \"{}\"", col, col));
            }
        }

        if exprs.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" REPLACE ({})", exprs.join(", ")))
        }
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Date32(days) => {
            // Days since the Unix epoch; serialize as an ISO calendar date
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date");
            serde_json::Value::String((epoch + Duration::days(i64::from(days))).to_string())
        }
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes).to_string();
            serde_json::Value::String(s)
        }
        ValueRef::Blob(bytes) => serde_json::Value::String(format!(
            "blob:{}",
            bytes
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<String>()
        )),
        _ => {
            // For other types (Time, Timestamp, Interval, List, etc.),
            // convert to string representation
            serde_json::Value::Null
        }
    }
}
