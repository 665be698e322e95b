//! `SearchCache`: the cache façade searchers and the orchestrator use.

use crate::backend::{CacheBackend, CacheResult};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cache façade tracking hit/miss/set/delete counters on top of a backend.
pub struct SearchCache {
    backend: Arc<dyn CacheBackend>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
}

impl SearchCache {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Build a cache key from scalar or structured arguments.
    ///
    /// A single scalar argument takes the fast path `"simple:{type}:{value}"`;
    /// anything else is serialised to canonical JSON and hashed.
    pub fn make_key(prefix: &str, args: &[&str]) -> String {
        if let [single] = args {
            return format!("simple:{prefix}:{single}");
        }
        let canonical = serde_json::to_string(&args).unwrap_or_default();
        Self::make_key_json(prefix, &canonical)
    }

    /// Build a cache key from an already-serialisable value, for callers
    /// composing keys from structured query objects rather than strings.
    pub fn make_key_from<T: Serialize>(prefix: &str, value: &T) -> String {
        let canonical = serde_json::to_string(value).unwrap_or_default();
        Self::make_key_json(prefix, &canonical)
    }

    fn make_key_json(prefix: &str, canonical: &str) -> String {
        let hash = blake3::hash(canonical.as_bytes());
        let mut hex = String::with_capacity(16);
        for byte in &hash.as_bytes()[..8] {
            let _ = write!(hex, "{byte:02x}");
        }
        format!("{prefix}:{hex}")
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let value = self.backend.get(key).await?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.backend.set(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.backend.delete(key).await
    }

    /// Delete every key matching a glob pattern.
    pub async fn invalidate_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let keys = self.backend.keys(pattern).await?;
        let mut removed = 0;
        for key in keys {
            if self.delete(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread().build().unwrap()
    }

    #[test]
    fn single_scalar_key_takes_fast_path() {
        let key = SearchCache::make_key("author", &["alice"]);
        assert_eq!(key, "simple:author:alice");
    }

    #[test]
    fn structured_key_is_stable() {
        let key1 = SearchCache::make_key("q", &["a", "b"]);
        let key2 = SearchCache::make_key("q", &["a", "b"]);
        let key3 = SearchCache::make_key("q", &["a", "c"]);
        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
    }

    #[test]
    fn counters_track_hits_and_misses() {
        rt().block_on(async {
            let cache = SearchCache::new(Arc::new(MemoryBackend::new(10, None)));
            cache.get("missing").await.unwrap();
            cache.set("present", b"v".to_vec(), None).await.unwrap();
            cache.get("present").await.unwrap();

            assert_eq!(cache.hits(), 1);
            assert_eq!(cache.misses(), 1);
            assert_eq!(cache.sets(), 1);
            assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);
        });
    }

    #[test]
    fn invalidate_pattern_deletes_matches() {
        rt().block_on(async {
            let cache = SearchCache::new(Arc::new(MemoryBackend::new(10, None)));
            cache.set("search:a", b"1".to_vec(), None).await.unwrap();
            cache.set("search:b", b"2".to_vec(), None).await.unwrap();
            cache.set("other:c", b"3".to_vec(), None).await.unwrap();

            let removed = cache.invalidate_pattern("search:*").await.unwrap();
            assert_eq!(removed, 2);
            assert!(cache.get("other:c").await.unwrap().is_some());
        });
    }
}
