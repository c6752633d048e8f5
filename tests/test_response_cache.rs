//! Response cache tests: key normalization, round-trips, simulated-clock
//! TTL expiry, lazy invalidation, degradation on corrupt entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use hotel_insights_sdk::{
    CacheEntry, CacheKey, CacheStore, FileStore, MemoryStore, ResponseCache,
};

fn entry(expires_at: DateTime<Utc>) -> CacheEntry {
    CacheEntry {
        body: serde_json::json!({"totalRevenue": 5200.0}),
        status: 200,
        headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
        expires_at,
    }
}

/// A cache whose clock the test can move.
fn cache_with_clock(start: DateTime<Utc>) -> (ResponseCache, Arc<Mutex<DateTime<Utc>>>) {
    let clock = Arc::new(Mutex::new(start));
    let handle = clock.clone();
    let cache = ResponseCache::new(Box::new(MemoryStore::new()))
        .with_clock(move || *handle.lock().unwrap());
    (cache, clock)
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

#[test]
fn key_is_order_independent() {
    let a = CacheKey::new("kpis")
        .param("businessDate", "2024-06-05")
        .param("periodType", "Month")
        .param("viewType", "Actual")
        .build();
    let b = CacheKey::new("kpis")
        .param("viewType", "Actual")
        .param("businessDate", "2024-06-05")
        .param("periodType", "Month")
        .build();
    assert_eq!(a, b);
}

#[test]
fn key_pairs_are_sorted_lexicographically() {
    let key = CacheKey::new("kpis")
        .param("viewType", "Actual")
        .param("businessDate", "2024-06-05")
        .build();
    assert_eq!(key, "kpis:businessDate=2024-06-05&viewType=Actual");
}

#[test]
fn absent_optional_params_contribute_nothing() {
    let with = CacheKey::new("kpis")
        .param("businessDate", "2024-06-05")
        .opt_param("property", Some("coast"))
        .build();
    let without = CacheKey::new("kpis")
        .param("businessDate", "2024-06-05")
        .opt_param("property", None::<&str>)
        .build();
    assert_ne!(with, without);
    assert_eq!(without, "kpis:businessDate=2024-06-05");
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[test]
fn memory_store_round_trip() {
    let store = MemoryStore::new();
    let e = entry(t0() + Duration::hours(24));
    store.put("k", &e);
    assert_eq!(store.get("k"), Some(e));
    store.delete("k");
    assert_eq!(store.get("k"), None);
}

#[test]
fn file_store_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path().to_path_buf()).unwrap();
    let e = entry(t0() + Duration::hours(24));

    store.put("kpis:businessDate=2024-06-05&property=coast", &e);
    assert_eq!(
        store.get("kpis:businessDate=2024-06-05&property=coast"),
        Some(e)
    );
    assert_eq!(store.get("some-other-key"), None);

    store.delete("kpis:businessDate=2024-06-05&property=coast");
    assert_eq!(store.get("kpis:businessDate=2024-06-05&property=coast"), None);
}

#[test]
fn file_store_overwrites_per_key() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path().to_path_buf()).unwrap();

    store.put("k", &entry(t0()));
    let newer = CacheEntry {
        body: serde_json::json!({"totalRevenue": 9999.0}),
        ..entry(t0() + Duration::hours(1))
    };
    store.put("k", &newer);

    assert_eq!(store.get("k"), Some(newer));
    // One file per key, overwritten rather than appended
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn corrupt_file_entries_degrade_to_a_miss() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileStore::new(tmp.path().to_path_buf()).unwrap();
    store.put("k", &entry(t0()));

    // Truncate the single cache file behind the store's back
    let file = std::fs::read_dir(tmp.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    std::fs::write(&file, "{not json").unwrap();

    assert_eq!(store.get("k"), None);
    // The corrupt file was removed so the next write starts clean
    assert!(!file.exists());
}

// ---------------------------------------------------------------------------
// TTL
// ---------------------------------------------------------------------------

#[test]
fn put_then_fetch_round_trips_within_ttl() {
    let (cache, _) = cache_with_clock(t0());
    cache.put("k", serde_json::json!({"x": 1}), 200);

    let hit = cache.fetch("k").unwrap();
    assert_eq!(hit.body, serde_json::json!({"x": 1}));
    assert_eq!(hit.status, 200);
    assert_eq!(hit.expires_at, t0() + Duration::hours(24));
}

#[test]
fn entries_expire_after_the_ttl_and_are_deleted_eagerly() {
    let (cache, clock) = cache_with_clock(t0());
    cache.put("k", serde_json::json!({"x": 1}), 200);

    // One minute before expiry: still a hit
    *clock.lock().unwrap() = t0() + Duration::hours(24) - Duration::minutes(1);
    assert!(cache.fetch("k").is_some());

    // At expiry: a miss, and the stale entry is removed
    *clock.lock().unwrap() = t0() + Duration::hours(24);
    assert!(cache.fetch("k").is_none());

    // Even if the clock is wound back, the entry is gone (eager delete)
    *clock.lock().unwrap() = t0();
    assert!(cache.fetch("k").is_none());
}

#[test]
fn custom_ttl_is_respected() {
    let clock = Arc::new(Mutex::new(t0()));
    let handle = clock.clone();
    let cache = ResponseCache::new(Box::new(MemoryStore::new()))
        .with_ttl(Duration::minutes(5))
        .with_clock(move || *handle.lock().unwrap());

    cache.put("k", serde_json::json!(1), 200);
    *clock.lock().unwrap() = t0() + Duration::minutes(4);
    assert!(cache.fetch("k").is_some());
    *clock.lock().unwrap() = t0() + Duration::minutes(6);
    assert!(cache.fetch("k").is_none());
}
