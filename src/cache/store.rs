//! Cache Store Module
//!
//! Disk-backed key/value cache with TTL expiration and oldest-first eviction.
//! The whole mapping lives in one JSON document that is loaded on first
//! access and rewritten atomically after every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{current_timestamp, CacheEntry, CacheStats, KeyOrder, LoadReport};
use crate::error::Result;
use crate::persist;

// == Cache State ==
/// Mutable state guarded by the cache lock.
#[derive(Debug, Default)]
struct CacheState {
    /// Whether the document has been read from disk
    loaded: bool,
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Insertion order of keys
    order: KeyOrder,
    /// Activity counters
    stats: CacheStats,
    /// Outcome of the initial load
    load_report: LoadReport,
}

impl CacheState {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.order.insert(&key);
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.remove(key);
        }
        removed
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Prune ==
    /// Drops expired entries, then the least recently updated entries until
    /// at most `max_entries` remain. A limit of 0 disables eviction.
    ///
    /// Returns the number of entries removed.
    fn prune(&mut self, max_entries: usize) -> usize {
        let now = current_timestamp();
        let expired: Vec<String> = self
            .order
            .iter()
            .filter(|key| {
                self.entries
                    .get(key.as_str())
                    .is_some_and(|entry| entry.is_expired_at(now))
            })
            .cloned()
            .collect();

        for key in &expired {
            self.remove(key);
        }
        self.stats.record_expirations(expired.len());

        let mut evicted = Vec::new();
        if max_entries > 0 && self.entries.len() > max_entries {
            let mut by_age: Vec<(&String, f64)> = self
                .order
                .iter()
                .filter_map(|key| self.entries.get(key).map(|entry| (key, entry.updated)))
                .collect();
            // Stable sort: insertion order breaks timestamp ties
            by_age.sort_by(|a, b| a.1.total_cmp(&b.1));

            let excess = self.entries.len() - max_entries;
            evicted = by_age
                .into_iter()
                .take(excess)
                .map(|(key, _)| key.clone())
                .collect();
        }

        for key in &evicted {
            self.remove(key);
        }
        self.stats.record_evictions(evicted.len());
        self.stats.set_total_entries(self.entries.len());

        if !evicted.is_empty() {
            debug!("Evicted {} oldest cache entries", evicted.len());
        }
        expired.len() + evicted.len()
    }
}

/// Serializes the mapping as a JSON object in insertion order.
struct Document<'a>(&'a CacheState);

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let state = self.0;
        serializer.collect_map(
            state
                .order
                .iter()
                .filter_map(|key| state.entries.get(key).map(|entry| (key, entry))),
        )
    }
}

// == File Cache ==
/// Persistent cache with TTL support and a maximum entry count.
///
/// All load/mutate/persist sequences of one instance are serialized by a
/// single lock. Separate instances pointed at the same file are not
/// coordinated; the last writer wins.
#[derive(Debug)]
pub struct FileCache {
    /// Location of the JSON document
    path: PathBuf,
    /// Maximum number of entries kept, 0 = unlimited
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl FileCache {
    // == Constructor ==
    /// Creates a cache backed by `path`. Nothing is read until first access.
    ///
    /// # Arguments
    /// * `path` - Location of the cache document
    /// * `max_entries` - Maximum number of entries, 0 disables the limit
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Acquires the lock and loads the document once.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.loaded {
            self.load_into(&mut state);
        }
        state
    }

    fn load_into(&self, state: &mut CacheState) {
        let document = persist::read_object_or_default(&self.path);

        state.clear();
        for (key, raw) in document {
            match serde_json::from_value::<CacheEntry>(raw) {
                Ok(entry) => state.insert(key, entry),
                Err(e) => warn!("Dropping malformed cache entry {:?}: {}", key, e),
            }
        }
        state.loaded = true;

        let loaded_entries = state.entries.len();
        let (expired_before, evicted_before) = (state.stats.expirations, state.stats.evictions);
        state.prune(self.max_entries);
        state.load_report = LoadReport {
            loaded_entries,
            expired_on_load: (state.stats.expirations - expired_before) as usize,
            evicted_on_load: (state.stats.evictions - evicted_before) as usize,
            ..LoadReport::default()
        };

        debug!(
            "Loaded {} cache entries from {}",
            state.entries.len(),
            self.path.display()
        );
    }

    /// Prunes and rewrites the whole document.
    fn save_locked(&self, state: &mut CacheState) -> Result<()> {
        state.prune(self.max_entries);
        persist::write_json(&self.path, &Document(state))
    }

    /// Returns the raw value of a live entry, dropping it if it has expired.
    fn lookup(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.lock();

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                state.stats.record_miss();
                return Ok(None);
            }
        };

        if expired {
            state.remove(key);
            state.stats.record_expirations(1);
            state.stats.record_miss();
            debug!("Cache entry {:?} expired", key);
            self.save_locked(&mut state)?;
            return Ok(None);
        }

        state.stats.record_hit();
        Ok(state.entries.get(key).map(|entry| entry.value.clone()))
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Absent, expired and `null` values all read as `None`. An expired entry
    /// is removed and the removal persisted before returning.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.lookup(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Retrieves a value by key, falling back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    // == Set ==
    /// Stores a value with optional TTL and persists the whole cache.
    ///
    /// Overwriting a key refreshes its `updated` timestamp and resets its TTL.
    /// A zero TTL stores an entry that is already expired; pass `None` for
    /// an entry that never expires.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - Any serializable value
    /// * `ttl` - Optional time to live, None = never expires
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut state = self.lock();
        state.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.save_locked(&mut state)
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.lock();
        if state.remove(key).is_none() {
            return Ok(false);
        }
        self.save_locked(&mut state)?;
        Ok(true)
    }

    // == Clear ==
    /// Removes every entry and persists the empty document.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock();
        state.clear();
        self.save_locked(&mut state)
    }

    // == Keys ==
    /// Returns live keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let mut state = self.lock();
        state.prune(self.max_entries);
        state.order.iter().cloned().collect()
    }

    // == Size ==
    /// Returns the number of live entries.
    pub fn size(&self) -> usize {
        let mut state = self.lock();
        state.prune(self.max_entries);
        state.entries.len()
    }

    // == Get Or Compute ==
    /// Returns the cached value or computes, stores and returns a new one.
    ///
    /// `producer` runs at most once, and only when no live, non-null value
    /// exists. The lock is not held while it runs.
    pub fn get_or_compute<T, F>(&self, key: &str, producer: F, ttl: Option<Duration>) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        let value = producer();
        self.set(key, &value, ttl)?;
        Ok(value)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and persists if anything changed.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let mut state = self.lock();
        let removed = state.prune(self.max_entries);
        if removed > 0 {
            self.save_locked(&mut state)?;
        }
        Ok(removed)
    }

    // == Time To Live ==
    /// Remaining lifetime of a live entry.
    ///
    /// Returns `None` for absent keys and for entries without expiry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let mut state = self.lock();
        state.prune(self.max_entries);
        state.entries.get(key).and_then(CacheEntry::ttl_remaining)
    }

    // == Load Report ==
    /// Returns what loading the document found and dropped, with the
    /// current entry count.
    pub fn load_report(&self) -> LoadReport {
        let state = self.lock();
        LoadReport {
            total_entries: state.entries.len(),
            max_entries: self.max_entries,
            ..state.load_report.clone()
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    ///
    /// Counters cover this instance only; they are not persisted.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::fs;
    use std::thread::sleep;
    use tempfile::TempDir;

    fn new_cache(temp_dir: &TempDir, max_entries: usize) -> FileCache {
        FileCache::new(temp_dir.path().join("cache.json"), max_entries)
    }

    #[test]
    fn test_cache_new_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        assert_eq!(cache.size(), 0);
        assert!(cache.keys().is_empty());
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_cache_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("key1", "value1", None).unwrap();
        let value: Option<String> = cache.get("key1").unwrap();

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_cache_get_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        let value: Option<String> = cache.get("nonexistent").unwrap();
        assert!(value.is_none());
        assert_eq!(cache.get_or("nonexistent", 7).unwrap(), 7);
    }

    #[test]
    fn test_cache_structured_values() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("list", &vec![1, 2, 3], None).unwrap();
        cache.set("obj", &json!({"a": true}), None).unwrap();

        assert_eq!(cache.get::<Vec<i32>>("list").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(cache.get::<Value>("obj").unwrap(), Some(json!({"a": true})));
    }

    #[test]
    fn test_cache_delete() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("key1", "value1", None).unwrap();
        assert!(cache.delete("key1").unwrap());
        assert!(!cache.delete("key1").unwrap());

        assert_eq!(cache.size(), 0);
        assert!(cache.get::<String>("key1").unwrap().is_none());
    }

    #[test]
    fn test_cache_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("key1", "value1", None).unwrap();
        cache.set("key1", "value2", None).unwrap();

        assert_eq!(cache.get::<String>("key1").unwrap().as_deref(), Some("value2"));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_cache_ttl_expiration_deletes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("t", "val", Some(Duration::from_millis(300))).unwrap();
        assert_eq!(cache.get::<String>("t").unwrap().as_deref(), Some("val"));

        sleep(Duration::from_millis(350));

        assert!(cache.get::<String>("t").unwrap().is_none());
        assert!(cache.get::<String>("t").unwrap().is_none());

        // Deletion was persisted
        let on_disk = fs::read_to_string(cache.path()).unwrap();
        assert!(!on_disk.contains("\"t\""));
    }

    #[test]
    fn test_cache_eviction_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 3);

        for key in ["a", "b", "c", "d"] {
            cache.set(key, key, None).unwrap();
        }

        assert_eq!(cache.size(), 3);
        assert!(cache.get::<String>("a").unwrap().is_none());
        assert_eq!(cache.get::<String>("d").unwrap().as_deref(), Some("d"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_cache_refresh_protects_from_eviction() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 3);

        cache.set("a", &1, None).unwrap();
        sleep(Duration::from_millis(5));
        cache.set("b", &2, None).unwrap();
        sleep(Duration::from_millis(5));
        cache.set("c", &3, None).unwrap();
        sleep(Duration::from_millis(5));

        // Rewriting "a" makes "b" the least recently updated
        cache.set("a", &10, None).unwrap();
        sleep(Duration::from_millis(5));
        cache.set("d", &4, None).unwrap();

        assert_eq!(cache.get::<i32>("a").unwrap(), Some(10));
        assert!(cache.get::<i32>("b").unwrap().is_none());
    }

    #[test]
    fn test_cache_zero_max_entries_is_unlimited() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 0);

        for i in 0..20 {
            cache.set(&format!("k{}", i), &i, None).unwrap();
        }
        assert_eq!(cache.size(), 20);
    }

    #[test]
    fn test_cache_keys_in_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("zeta", &1, None).unwrap();
        cache.set("alpha", &2, None).unwrap();
        cache.set("mid", &3, None).unwrap();

        assert_eq!(cache.keys(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_cache_keys_skip_expired() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("short", &1, Some(Duration::from_millis(100))).unwrap();
        cache.set("long", &2, None).unwrap();

        sleep(Duration::from_millis(150));

        assert_eq!(cache.keys(), vec!["long"]);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_cache_clear() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("a", &1, None).unwrap();
        cache.set("b", &2, None).unwrap();
        cache.clear().unwrap();

        assert_eq!(cache.size(), 0);
        let reopened = new_cache(&temp_dir, 100);
        assert_eq!(reopened.size(), 0);
    }

    #[test]
    fn test_cache_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        let cache = new_cache(&temp_dir, 100);
        cache.set("x", &1, None).unwrap();
        cache.set("y", "two", Some(Duration::from_secs(60))).unwrap();

        let reopened = new_cache(&temp_dir, 100);
        assert_eq!(reopened.get::<i32>("x").unwrap(), Some(1));
        assert_eq!(reopened.get::<String>("y").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_cache_corrupted_document_resets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(&path, "{ this is not json").unwrap();

        let cache = FileCache::new(&path, 100);
        assert_eq!(cache.size(), 0);

        cache.set("fresh", &1, None).unwrap();
        assert_eq!(cache.get::<i32>("fresh").unwrap(), Some(1));
    }

    #[test]
    fn test_cache_non_object_document_resets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let cache = FileCache::new(&path, 100);
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_cache_malformed_entry_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"good": {"value": 1, "expires": null, "updated": 1.0}, "bad": "oops"}"#,
        )
        .unwrap();

        let cache = FileCache::new(&path, 100);
        assert_eq!(cache.keys(), vec!["good"]);
    }

    #[test]
    fn test_cache_expired_on_disk_not_loaded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"old": {"value": 1, "expires": 1.0, "updated": 0.5}}"#,
        )
        .unwrap();

        let cache = FileCache::new(&path, 100);
        assert!(cache.get::<i32>("old").unwrap().is_none());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_get_or_compute_calls_producer_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);
        let calls = Cell::new(0);

        let produce = |value: i32| {
            calls.set(calls.get() + 1);
            value
        };

        let ttl = Some(Duration::from_secs(60));
        let first = cache.get_or_compute("compute", || produce(999), ttl).unwrap();
        let second = cache.get_or_compute("compute", || produce(0), None).unwrap();

        assert_eq!(first, 999);
        assert_eq!(second, 999);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.get::<i32>("compute").unwrap(), Some(999));
    }

    #[test]
    fn test_get_or_compute_treats_null_as_missing() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("nothing", &Value::Null, None).unwrap();
        let value = cache.get_or_compute("nothing", || "filled".to_string(), None).unwrap();

        assert_eq!(value, "filled");
    }

    #[test]
    fn test_cache_type_mismatch_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("text", "not a number", None).unwrap();
        assert!(cache.get::<i32>("text").is_err());
    }

    #[test]
    fn test_cache_cleanup_expired() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("key1", "value1", Some(Duration::from_millis(100))).unwrap();
        cache.set("key2", "value2", Some(Duration::from_secs(10))).unwrap();

        sleep(Duration::from_millis(150));

        assert_eq!(cache.cleanup_expired().unwrap(), 1);
        assert_eq!(cache.size(), 1);
        assert!(cache.get::<String>("key2").unwrap().is_some());
    }

    #[test]
    fn test_cache_ttl_remaining() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("ttl", &1, Some(Duration::from_secs(30))).unwrap();
        cache.set("forever", &1, None).unwrap();

        let remaining = cache.ttl_remaining("ttl").unwrap();
        assert!(remaining <= Duration::from_secs(30));
        assert!(remaining > Duration::from_secs(28));
        assert!(cache.ttl_remaining("forever").is_none());
        assert!(cache.ttl_remaining("absent").is_none());
    }

    #[test]
    fn test_cache_stats() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("key1", "value1", None).unwrap();
        cache.get::<String>("key1").unwrap();
        cache.get::<String>("nonexistent").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_zero_ttl_is_already_expired() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("zero", "gone", Some(Duration::ZERO)).unwrap();
        cache.set("forever", "kept", None).unwrap();

        assert_eq!(cache.get::<String>("zero").unwrap(), None);
        assert_eq!(cache.get::<String>("forever").unwrap().as_deref(), Some("kept"));
        assert_eq!(cache.ttl_remaining("forever"), None);
    }

    #[test]
    fn test_load_report_from_fresh_instance() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = new_cache(&temp_dir, 0);
            cache.set("a", &1, None).unwrap();
            sleep(Duration::from_millis(2));
            cache.set("b", &2, None).unwrap();
            sleep(Duration::from_millis(2));
            cache.set("c", &3, None).unwrap();
            cache.set("short", &4, Some(Duration::from_millis(20))).unwrap();
        }
        sleep(Duration::from_millis(40));

        let reopened = new_cache(&temp_dir, 2);
        let report = reopened.load_report();
        assert_eq!(report.loaded_entries, 4);
        assert_eq!(report.expired_on_load, 1);
        assert_eq!(report.evicted_on_load, 1);
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.max_entries, 2);
    }

    #[test]
    fn test_cache_document_shape() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir, 100);

        cache.set("k", "v", None).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        let entry = &raw["k"];
        assert_eq!(entry["value"], json!("v"));
        assert!(entry["expires"].is_null());
        assert!(entry["updated"].as_f64().unwrap() > 0.0);
    }
}
