//! Cache backend contract
//!
//! Every backend - in-process or namespaced - implements the same small
//! async contract. None of these methods raise on a normal cache miss;
//! errors are reserved for serialization/IO-style failures.

use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value. `None` on miss or expiry, never an error.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value. `ttl` of `None` or zero means no expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<bool>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    async fn clear(&self) -> CacheResult<()>;

    /// List keys matching a glob pattern (`*` wildcard). Defaults to `"*"`.
    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>>;
}
