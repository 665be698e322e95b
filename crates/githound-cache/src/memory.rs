//! In-process LRU cache backend with optional byte-size capping.

use crate::backend::{CacheBackend, CacheResult};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    inserted_at: Instant,
    ttl: Option<Duration>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.ttl
            .is_some_and(|ttl| !ttl.is_zero() && self.inserted_at.elapsed() > ttl)
    }
}

struct Inner {
    entries: LruCache<String, Entry>,
    max_memory_bytes: Option<usize>,
    current_bytes: usize,
}

/// A plain in-process cache backend. Bounded by entry count (`max_size`)
/// and, optionally, total estimated byte size (`max_memory_mb`).
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(max_size: usize, max_memory_mb: Option<u64>) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                max_memory_bytes: max_memory_mb.map(|mb| (mb * 1024 * 1024) as usize),
                current_bytes: 0,
            }),
        }
    }

    fn evict_for_space(inner: &mut Inner, needed: usize) {
        let Some(cap) = inner.max_memory_bytes else {
            return;
        };
        while inner.current_bytes + needed > cap {
            let Some((_, evicted)) = inner.entries.pop_lru() else {
                break;
            };
            inner.current_bytes = inner.current_bytes.saturating_sub(evicted.value.len());
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let expired = inner.entries.peek(key).is_some_and(Entry::is_expired);
        if expired {
            if let Some(removed) = inner.entries.pop(key) {
                inner.current_bytes = inner.current_bytes.saturating_sub(removed.value.len());
            }
            return Ok(None);
        }
        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let size = value.len();

        if let Some(old) = inner.entries.peek(key) {
            inner.current_bytes = inner.current_bytes.saturating_sub(old.value.len());
        }

        Self::evict_for_space(&mut inner, size);

        inner.current_bytes += size;
        if let Some((_, evicted)) = inner.entries.push(
            key.to_string(),
            Entry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        ) {
            inner.current_bytes = inner.current_bytes.saturating_sub(evicted.value.len());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match inner.entries.pop(key) {
            Some(removed) => {
                inner.current_bytes = inner.current_bytes.saturating_sub(removed.value.len());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(inner
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.clear();
        inner.current_bytes = 0;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let glob = globset::Glob::new(pattern)?.compile_matcher();
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(k, _)| k.clone())
            .filter(|k| glob.is_match(k))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
    }

    #[test]
    fn set_then_get_round_trips() {
        rt().block_on(async {
            let backend = MemoryBackend::new(10, None);
            backend.set("a", b"hello".to_vec(), None).await.unwrap();
            assert_eq!(backend.get("a").await.unwrap(), Some(b"hello".to_vec()));
        });
    }

    #[test]
    fn expired_entry_returns_miss() {
        rt().block_on(async {
            let backend = MemoryBackend::new(10, None);
            backend
                .set("a", b"hi".to_vec(), Some(Duration::from_millis(1)))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(backend.get("a").await.unwrap(), None);
        });
    }

    #[test]
    fn evicts_least_recently_used_past_capacity() {
        rt().block_on(async {
            let backend = MemoryBackend::new(2, None);
            backend.set("a", b"1".to_vec(), None).await.unwrap();
            backend.set("b", b"2".to_vec(), None).await.unwrap();
            backend.set("c", b"3".to_vec(), None).await.unwrap();
            assert_eq!(backend.get("a").await.unwrap(), None);
            assert!(backend.get("c").await.unwrap().is_some());
        });
    }

    #[test]
    fn evicts_on_memory_pressure() {
        rt().block_on(async {
            let backend = MemoryBackend::new(100, Some(1)); // 1 MiB budget
            backend.set("a", vec![0u8; 700_000], None).await.unwrap();
            backend.set("b", vec![0u8; 700_000], None).await.unwrap();
            assert_eq!(backend.get("a").await.unwrap(), None);
            assert!(backend.get("b").await.unwrap().is_some());
        });
    }

    #[test]
    fn keys_filters_by_glob() {
        rt().block_on(async {
            let backend = MemoryBackend::new(10, None);
            backend.set("search:a", b"1".to_vec(), None).await.unwrap();
            backend.set("search:b", b"2".to_vec(), None).await.unwrap();
            backend.set("other:c", b"3".to_vec(), None).await.unwrap();
            let mut keys = backend.keys("search:*").await.unwrap();
            keys.sort();
            assert_eq!(keys, vec!["search:a".to_string(), "search:b".to_string()]);
        });
    }
}
