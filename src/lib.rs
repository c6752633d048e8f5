//! Hospitality analytics SDK for Rust.
//!
//! Provides a high-level client for the reservation/revenue dashboard
//! queries: KPI cards, dimension splits and pickup comparisons over the
//! warehouse's nightly parquet exports, cached locally and queried
//! in-process via DuckDB.
//!
//! The calendar core (window resolution, comparison alignment, bucket
//! sequencing and the response cache) is exposed directly so callers can
//! build further endpoints on the same machinery.
//!
//! # Quick start
//!
//! ```no_run
//! use hotel_insights_sdk::{InsightsSdk, KpiParams};
//!
//! let sdk = InsightsSdk::builder().build().unwrap();
//!
//! // Overview KPI cards for the default (month-to-date) window
//! let report = sdk.kpis().report(&KpiParams::default()).unwrap();
//! println!("total revenue: {}", report.total_revenue.value);
//! ```

pub mod align;
#[cfg(feature = "async")]
pub mod async_client;
pub mod buckets;
pub mod comparison;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod names;
pub mod period;
pub mod queries;
pub mod response_cache;
pub mod snapshot;
pub mod sql_builder;

pub use align::{align_date, join_series, percentage_change, SeriesPoint};
#[cfg(feature = "async")]
pub use async_client::AsyncInsightsSdk;
pub use buckets::{bucket_of, sequence_buckets};
pub use comparison::{
    ComparisonPolicy, ComparisonResolver, ComparisonResult, ComparisonSelector,
};
pub use connection::Connection;
pub use error::{InsightsError, Result};
pub use period::{resolve_window, DateWindow, Granularity, ViewType};
pub use queries::{DistributionParams, KpiParams, PickupParams};
pub use response_cache::{CacheEntry, CacheKey, CacheStore, FileStore, MemoryStore, ResponseCache};
pub use snapshot::SnapshotStore;
pub use sql_builder::SqlBuilder;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// InsightsSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`InsightsSdk`] instance.
///
/// Use [`InsightsSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](InsightsSdkBuilder::build) to create the SDK.
pub struct InsightsSdkBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    base_url: Option<String>,
    response_ttl: Option<chrono::Duration>,
    response_store: Option<Box<dyn CacheStore>>,
}

impl Default for InsightsSdkBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            base_url: None,
            response_ttl: None,
            response_store: None,
        }
    }
}

impl InsightsSdkBuilder {
    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/hotel-insights-sdk` on Linux,
    /// `~/Library/Caches/hotel-insights-sdk` on macOS,
    /// `%LOCALAPPDATA%\hotel-insights-sdk` on Windows).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the SDK never downloads exports and only uses
    /// previously cached data files. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for export downloads.
    ///
    /// Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the SDK at a non-default export endpoint.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Override the response-cache time-to-live (default 24 hours).
    pub fn response_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.response_ttl = Some(ttl);
        self
    }

    /// Inject a response-cache storage backend.
    ///
    /// Defaults to a [`FileStore`] under `<cache_dir>/responses`; tests
    /// typically pass a [`MemoryStore`].
    pub fn response_store(mut self, store: Box<dyn CacheStore>) -> Self {
        self.response_store = Some(store);
        self
    }

    /// Build the SDK, initializing the snapshot store, the DuckDB
    /// connection and the response cache.
    ///
    /// This may trigger a version check against the warehouse (unless
    /// offline mode is enabled) but does **not** download any data files
    /// eagerly -- they are fetched lazily on first query.
    pub fn build(self) -> Result<InsightsSdk> {
        let cache_dir = self.cache_dir.unwrap_or_else(config::default_cache_dir);
        let snapshots = match self.base_url {
            Some(url) => SnapshotStore::with_base_url(
                Some(cache_dir.clone()),
                self.offline,
                self.timeout,
                &url,
            )?,
            None => SnapshotStore::new(Some(cache_dir.clone()), self.offline, self.timeout)?,
        };
        let conn = Connection::new(snapshots)?;

        let store = match self.response_store {
            Some(store) => store,
            None => Box::new(FileStore::new(cache_dir.join("responses"))?),
        };
        let mut responses = ResponseCache::new(store);
        if let Some(ttl) = self.response_ttl {
            responses = responses.with_ttl(ttl);
        }

        Ok(InsightsSdk { conn, responses })
    }
}

// ---------------------------------------------------------------------------
// InsightsSdk
// ---------------------------------------------------------------------------

/// The main entry point for the insights SDK.
///
/// Wraps a [`Connection`] (which owns the [`SnapshotStore`] and DuckDB
/// database) plus the shared [`ResponseCache`], and exposes the endpoint
/// query interfaces as lightweight borrowing wrappers.
///
/// Created via [`InsightsSdk::builder()`].
pub struct InsightsSdk {
    conn: Connection,
    responses: ResponseCache,
}

impl InsightsSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> InsightsSdkBuilder {
        InsightsSdkBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the overview KPI query interface.
    ///
    /// Returns a lightweight wrapper that borrows from the underlying
    /// connection and response cache.
    pub fn kpis(&self) -> queries::kpis::KpiQuery<'_> {
        queries::kpis::KpiQuery::new(&self.conn, &self.responses)
    }

    /// Access the distribution (dimension split) query interface.
    pub fn distribution(&self) -> queries::distribution::DistributionQuery<'_> {
        queries::distribution::DistributionQuery::new(&self.conn, &self.responses)
    }

    /// Access the pickup query interface.
    pub fn pickup(&self) -> queries::pickup::PickupQuery<'_> {
        queries::pickup::PickupQuery::new(&self.conn, &self.responses)
    }

    // -- Metadata and utility methods --------------------------------------

    /// Load and return the export manifest (version, generation time, etc.).
    ///
    /// Fetches `Manifest.json` from the cache (downloading if necessary) and
    /// returns the parsed JSON object.
    pub fn manifest(&self) -> Result<serde_json::Value> {
        self.conn.snapshots.borrow_mut().load_json("manifest")
    }

    /// Load the portfolio's property list.
    pub fn properties(&self) -> Result<Vec<models::Property>> {
        let value = self.conn.snapshots.borrow_mut().load_json("properties")?;
        Ok(serde_json::from_value(value)?)
    }

    /// Return the list of currently registered DuckDB view names.
    ///
    /// Views are registered lazily on first query, so this list grows as
    /// different query interfaces are used.
    pub fn views(&self) -> Vec<String> {
        self.conn.views()
    }

    /// Execute a raw SQL query against the DuckDB database.
    ///
    /// Provides escape-hatch access for queries not covered by the
    /// endpoint interfaces.
    ///
    /// # Arguments
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    ///
    /// # Returns
    ///
    /// A vector of rows, each represented as a `HashMap<String, serde_json::Value>`.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Check for a newer export and reset views if stale.
    ///
    /// Returns `true` if the data was stale and views were reset (meaning
    /// subsequent queries will re-download data), or `false` if already
    /// up to date.
    pub fn refresh(&self) -> Result<bool> {
        let stale = self.conn.snapshots.borrow_mut().is_stale()?;
        if stale {
            self.conn.snapshots.borrow().clear()?;
            self.conn.reset_views();
            tracing::info!("export data was stale; cache cleared and views reset");
        }
        Ok(stale)
    }

    /// Consume the SDK and release all resources.
    ///
    /// Closes the DuckDB connection and HTTP client. This is called
    /// automatically when the SDK is dropped, but can be invoked explicitly
    /// for deterministic cleanup.
    pub fn close(self) {
        // Connection, SnapshotStore and ResponseCache drop automatically
        drop(self);
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying [`Connection`].
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return a reference to the shared [`ResponseCache`].
    pub fn response_cache(&self) -> &ResponseCache {
        &self.responses
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for InsightsSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let views = self.conn.views();
        let snapshots = self.conn.snapshots.borrow();
        write!(
            f,
            "InsightsSdk(cache_dir={}, views=[{}], offline={})",
            snapshots.cache_dir.display(),
            views.join(", "),
            snapshots.offline
        )
    }
}
