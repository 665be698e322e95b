//! Namespaced backend wrapper, standing in for an out-of-process cache.
//!
//! Wraps any [`CacheBackend`] (typically a shared/remote one) and applies
//! the conventions a networked backend needs: key prefixing and
//! transparent compression for larger values.

use crate::backend::{CacheBackend, CacheResult};
use crate::error::CacheError;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write as _};
use std::sync::Arc;
use std::time::Duration;

const COMPRESSION_THRESHOLD_BYTES: usize = 1024;
const MARKER_COMPRESSED: u8 = 0x01;
const MARKER_UNCOMPRESSED: u8 = 0x00;

/// Wraps an inner [`CacheBackend`], prefixing every key with a namespace
/// and compressing values over 1KB before delegating.
pub struct NamespacedBackend {
    inner: Arc<dyn CacheBackend>,
    namespace: String,
}

impl NamespacedBackend {
    #[must_use]
    pub fn new(inner: Arc<dyn CacheBackend>, namespace: impl Into<String>) -> Self {
        Self {
            inner,
            namespace: namespace.into(),
        }
    }

    fn namespaced_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn strip_namespace<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(&format!("{}:", self.namespace)).unwrap_or(key)
    }

    fn encode(value: &[u8]) -> CacheResult<Vec<u8>> {
        if value.len() <= COMPRESSION_THRESHOLD_BYTES {
            let mut out = Vec::with_capacity(value.len() + 1);
            out.push(MARKER_UNCOMPRESSED);
            out.extend_from_slice(value);
            return Ok(out);
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(value)
            .map_err(|e| CacheError::Compression(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| CacheError::Compression(e.to_string()))?;

        let mut out = Vec::with_capacity(compressed.len() + 1);
        out.push(MARKER_COMPRESSED);
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    fn decode(raw: &[u8]) -> CacheResult<Vec<u8>> {
        let Some((&marker, body)) = raw.split_first() else {
            return Ok(Vec::new());
        };
        match marker {
            MARKER_COMPRESSED => {
                let mut decoder = GzDecoder::new(body);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| CacheError::Compression(e.to_string()))?;
                Ok(out)
            }
            _ => Ok(body.to_vec()),
        }
    }
}

#[async_trait]
impl CacheBackend for NamespacedBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        match self.inner.get(&self.namespaced_key(key)).await? {
            Some(raw) => Ok(Some(Self::decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let encoded = Self::encode(&value)?;
        // TTL <= 0 (including None) means no expiry at the inner backend.
        let ttl = ttl.filter(|d| !d.is_zero());
        self.inner.set(&self.namespaced_key(key), encoded, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.inner.delete(&self.namespaced_key(key)).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.inner.exists(&self.namespaced_key(key)).await
    }

    async fn clear(&self) -> CacheResult<()> {
        for key in self.inner.keys(&format!("{}:*", self.namespace)).await? {
            self.inner.delete(&key).await?;
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let namespaced_pattern = format!("{}:{}", self.namespace, pattern);
        let keys = self.inner.keys(&namespaced_pattern).await?;
        Ok(keys.iter().map(|k| self.strip_namespace(k).to_string()).collect())
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
    fn small_value_round_trips_uncompressed() {
        rt().block_on(async {
            let backend = NamespacedBackend::new(Arc::new(MemoryBackend::new(10, None)), "ns");
            backend.set("k", b"small".to_vec(), None).await.unwrap();
            assert_eq!(backend.get("k").await.unwrap(), Some(b"small".to_vec()));
        });
    }

    #[test]
    fn large_value_round_trips_compressed() {
        rt().block_on(async {
            let backend = NamespacedBackend::new(Arc::new(MemoryBackend::new(10, None)), "ns");
            let value = vec![b'x'; 5000];
            backend.set("k", value.clone(), None).await.unwrap();
            assert_eq!(backend.get("k").await.unwrap(), Some(value));
        });
    }

    #[test]
    fn keys_are_scoped_to_namespace() {
        rt().block_on(async {
            let inner = Arc::new(MemoryBackend::new(10, None));
            let a = NamespacedBackend::new(inner.clone(), "a");
            let b = NamespacedBackend::new(inner, "b");
            a.set("x", b"1".to_vec(), None).await.unwrap();
            b.set("x", b"2".to_vec(), None).await.unwrap();
            assert_eq!(a.keys("*").await.unwrap(), vec!["x".to_string()]);
            assert_eq!(b.get("x").await.unwrap(), Some(b"2".to_vec()));
        });
    }
}
