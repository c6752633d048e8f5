//! Durable memoization of endpoint responses.
//!
//! A full response body (plus status and headers) is stored per normalized
//! parameter set with a fixed time-to-live, evaluated at read time. Stale
//! entries are deleted on the read that finds them; there is no background
//! eviction. The storage backend is an injected port so tests can run
//! against memory and production against disk or any durable KV store.
//!
//! Store I/O never fails a request: every error degrades to "recompute" and
//! is logged.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config;
use crate::error::Result;

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// A memoized response: everything needed to replay it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub body: serde_json::Value,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Builds cache keys from a fixed, known subset of request parameters.
///
/// Callers list exactly the parameters their response depends on, with the
/// same default substitution the business logic applies (an absent business
/// date contributes the resolved "today", never an empty value). Pairs are
/// sorted before joining so logically identical requests with differently
/// ordered query strings collide on the same key.
#[derive(Debug, Clone)]
pub struct CacheKey {
    scope: String,
    parts: Vec<String>,
}

impl CacheKey {
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            parts: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Display) -> Self {
        self.parts.push(format!("{}={}", name, value));
        self
    }

    /// Include the parameter only when present; absent optionals contribute
    /// nothing (distinct from an empty value).
    pub fn opt_param(self, name: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn build(mut self) -> String {
        self.parts.sort();
        format!("{}:{}", self.scope, self.parts.join("&"))
    }
}

// ---------------------------------------------------------------------------
// CacheStore
// ---------------------------------------------------------------------------

/// Storage port for memoized responses.
///
/// Implementations are infallible at the trait boundary: they log failures
/// and report "absent" or silently skip, so cache trouble can never break a
/// request. Per-key overwrite must be atomic; no further coordination is
/// required, since two racing writes for the same key carry equally valid
/// independently-computed results.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn put(&self, key: &str, entry: &CacheEntry);
    fn delete(&self, key: &str);
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One JSON file per key under a spool directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the store, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Hex-encode the key so any parameter content maps to a safe,
    /// collision-free file name.
    fn file_path(&self, key: &str) -> PathBuf {
        let safe: String = key.bytes().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.file_path(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, error = %e, "response cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(entry) => Some(entry),
            Err(e) => {
                // Corrupt entry (torn write, disk error): drop it so the
                // next computation replaces it.
                warn!(key, error = %e, "corrupt response cache entry, removing");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    fn put(&self, key: &str, entry: &CacheEntry) {
        let path = self.file_path(key);
        let tmp = path.with_extension("json.tmp");
        let result = serde_json::to_string(entry)
            .map_err(std::io::Error::other)
            .and_then(|data| fs::write(&tmp, data))
            .and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            warn!(key, error = %e, "response cache write failed");
            let _ = fs::remove_file(&tmp);
        }
    }

    fn delete(&self, key: &str) {
        let path = self.file_path(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key, error = %e, "response cache delete failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    fn put(&self, key: &str, entry: &CacheEntry) {
        self.lock().insert(key.to_string(), entry.clone());
    }

    fn delete(&self, key: &str) {
        self.lock().remove(key);
    }
}

// ---------------------------------------------------------------------------
// ResponseCache
// ---------------------------------------------------------------------------

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// TTL policy and lazy invalidation over a [`CacheStore`].
pub struct ResponseCache {
    store: Box<dyn CacheStore>,
    ttl: Duration,
    clock: Clock,
}

impl ResponseCache {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self {
            store,
            ttl: Duration::hours(config::RESPONSE_CACHE_TTL_HOURS),
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replace the wall clock, for simulated-time tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Look up a live entry. An expired entry counts as a miss and is
    /// deleted eagerly before returning.
    pub fn fetch(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.store.get(key)?;
        if self.now() < entry.expires_at {
            Some(entry)
        } else {
            self.store.delete(key);
            None
        }
    }

    /// Memoize a successful response. Failed computations must never reach
    /// this method, so errors are retried on the next request.
    pub fn put(&self, key: &str, body: serde_json::Value, status: u16) {
        let entry = CacheEntry {
            body,
            status,
            headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            expires_at: self.now() + self.ttl,
        };
        self.store.put(key, &entry);
    }

    pub fn delete(&self, key: &str) {
        self.store.delete(key);
    }
}
