//! Pluggable caching for githound's search engine
//!
//! A small async [`CacheBackend`] contract with two implementations - an
//! in-process [`MemoryBackend`] and a [`NamespacedBackend`] wrapper that
//! adds key prefixing and size-based compression, standing in for an
//! out-of-process backend - plus the [`SearchCache`] façade searchers and
//! the orchestrator use for keying and hit-rate tracking.

pub mod backend;
pub mod error;
pub mod memory;
pub mod namespaced;
pub mod search_cache;

pub use backend::{CacheBackend, CacheResult};
pub use error::CacheError;
pub use memory::MemoryBackend;
pub use namespaced::NamespacedBackend;
pub use search_cache::SearchCache;
