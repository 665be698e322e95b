//! The base searcher contract and its capability mixins.

use crate::model::{SearchContext, SearchQuery, SearchResult};
use async_trait::async_trait;
use githound_git::repo_hash;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Read-only view of a searcher's per-instance counters.
#[derive(Debug, Default)]
pub struct SearcherMetrics {
    pub commits_searched: AtomicU64,
    pub files_searched: AtomicU64,
    pub results_found: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl SearcherMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A component that matches one axis of a query and streams results.
///
/// `search` must never raise out of the stream (§4.1.2): a searcher that
/// hits a per-item error logs and skips; only a catastrophic repository
/// failure ends the stream early, with whatever was already produced
/// kept.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Stable identifier used in cache keys and logs.
    fn name(&self) -> &str;

    /// Cheap predicate: does this query exercise an axis this searcher owns?
    fn can_handle(&self, query: &SearchQuery) -> bool;

    /// A unitless effort estimate, used only for progress weighting.
    fn estimate_work(&self, context: &SearchContext) -> u64;

    /// Run the search, returning every produced result. A searcher that
    /// cannot handle the query returns an empty vector.
    async fn search(&self, context: &SearchContext) -> Vec<SearchResult>;

    /// Read-only per-instance counters.
    fn metrics(&self) -> &SearcherMetrics;
}

/// Composes a stable cache key from `(name_prefix, repo_identity,
/// branch_or_HEAD, query_hash, suffix)`.
pub trait Cacheable {
    fn cache_key_prefix(&self) -> &str;

    fn cache_key(&self, context: &SearchContext, suffix: &str) -> String {
        let repo_identity = repo_hash(&context.query_identity_hint());
        let branch = context.branch.as_deref().unwrap_or("HEAD");
        let query_hash = githound_cache::SearchCache::make_key_from("q", &context.query);
        format!("{}:{repo_identity}:{branch}:{query_hash}:{suffix}", self.cache_key_prefix())
    }
}

/// Every [`Searcher`] is cacheable under its own `name()`: the orchestrator
/// consults `context.cache` through this impl around each searcher's
/// `search()` call rather than requiring bespoke caching per searcher.
impl<T: Searcher + ?Sized> Cacheable for T {
    fn cache_key_prefix(&self) -> &str {
        self.name()
    }
}

impl SearchContext {
    /// A stable-enough string to key repository identity on, when the
    /// repository collaborator doesn't expose a remote URL at this call
    /// site. Callers that know the real identity should prefer hashing
    /// that instead; this is a reasonable fallback keyed on the working
    /// directory path once resolved.
    fn query_identity_hint(&self) -> String {
        self.branch.clone().unwrap_or_default()
    }
}

/// Bounds concurrent inner tasks via a counting semaphore.
pub struct Parallel {
    semaphore: Arc<Semaphore>,
}

impl Parallel {
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_workers.max(1))) }
    }

    /// Run `f` once a worker permit is available.
    pub async fn run<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let _permit = self.semaphore.acquire().await.expect("semaphore not closed");
        f().await
    }
}

impl Default for Parallel {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Default per-searcher commit-walk cap, overridable by callers (§4.1.1).
pub const DEFAULT_COMMIT_CAP: usize = 1000;

/// Cache-entry time-to-live used by searchers that cache intermediate
/// results (distinct from the whole-query cache the enhanced
/// orchestrator maintains).
pub const SEARCHER_CACHE_TTL: Duration = Duration::from_secs(300);
