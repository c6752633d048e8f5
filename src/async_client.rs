//! Async wrapper around [`InsightsSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! DuckDB queries are CPU-bound but fast, making this approach efficient.
//!
//! # Example
//!
//! ```no_run
//! use hotel_insights_sdk::{AsyncInsightsSdk, KpiParams};
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncInsightsSdk::builder().build().await.unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let report = sdk.run(|s| {
//!         s.kpis().report(&KpiParams::default())
//!     }).await.unwrap();
//!
//!     // Convenience method for raw SQL
//!     let rows = sdk.sql("SELECT COUNT(*) FROM insights", &[]).await.unwrap();
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{InsightsError, Result};
use crate::InsightsSdk;

// ---------------------------------------------------------------------------
// AsyncInsightsSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncInsightsSdk`] instance.
pub struct AsyncInsightsSdkBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    base_url: Option<String>,
}

impl Default for AsyncInsightsSdkBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            base_url: None,
        }
    }
}

impl AsyncInsightsSdkBuilder {
    /// Set a custom cache directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for export downloads.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the SDK at a non-default export endpoint.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Build the async SDK, initializing the caches and DuckDB connection.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncInsightsSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = InsightsSdk::builder();
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            if let Some(url) = self.base_url {
                builder = builder.base_url(&url);
            }
            builder = builder.offline(self.offline).timeout(self.timeout);
            let sdk = builder.build()?;
            Ok(AsyncInsightsSdk {
                inner: Arc::new(Mutex::new(sdk)),
            })
        })
        .await
        .map_err(|e| InsightsError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncInsightsSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`InsightsSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying [`InsightsSdk`] is
/// protected by a [`Mutex`] since it uses `RefCell` internally.
///
/// # Usage
///
/// Use [`run()`](Self::run) to execute any sync SDK method:
///
/// ```no_run
/// # use hotel_insights_sdk::AsyncInsightsSdk;
/// # async fn example() -> hotel_insights_sdk::Result<()> {
/// let sdk = AsyncInsightsSdk::builder().build().await?;
/// let properties = sdk.run(|s| s.properties()).await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncInsightsSdk {
    inner: Arc<Mutex<InsightsSdk>>,
}

impl AsyncInsightsSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncInsightsSdkBuilder {
        AsyncInsightsSdkBuilder::default()
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&InsightsSdk` reference and should return
    /// a `Result<T>`. The operation runs on a dedicated blocking thread,
    /// keeping the async event loop free.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use hotel_insights_sdk::{AsyncInsightsSdk, PickupParams};
    /// # async fn example() -> hotel_insights_sdk::Result<()> {
    /// # let sdk = AsyncInsightsSdk::builder().build().await?;
    /// let report = sdk.run(|s| {
    ///     s.pickup().report(&PickupParams::default())
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&InsightsSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| InsightsError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| InsightsError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Execute a raw SQL query asynchronously.
    ///
    /// Convenience wrapper around [`run()`](Self::run) for
    /// [`InsightsSdk::sql()`].
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |s| s.sql(&query, &params)).await
    }

    /// Load and return the export manifest asynchronously.
    pub async fn manifest(&self) -> Result<serde_json::Value> {
        self.run(|s| s.manifest()).await
    }

    /// Check for a newer export and reset views if stale.
    pub async fn refresh(&self) -> Result<bool> {
        self.run(|s| s.refresh()).await
    }

    /// Return the list of currently registered DuckDB view names.
    pub async fn views(&self) -> Result<Vec<String>> {
        self.run(|s| Ok(s.views())).await
    }

    /// Close the SDK, releasing all resources.
    ///
    /// After calling this, subsequent operations will fail with a
    /// poisoned lock error.
    pub async fn close(self) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            let sdk = self
                .inner
                .lock()
                .map_err(|_| InsightsError::InvalidArgument("SDK lock poisoned".into()))?;
            // Dropping the MutexGuard drops the SDK
            drop(sdk);
            Ok(())
        })
        .await
        .map_err(|e| InsightsError::InvalidArgument(format!("Task join error: {e}")))?
    }
}
