//! Wraps the base orchestrator with a whole-query cache, an
//! index-driven fast path, and a profiler (§4.7).

use crate::error::Result;
use crate::model::{CommitInfo, ProgressCallback, SearchMetrics, SearchQuery, SearchResult, SearchType};
use crate::optimize::QueryOptimizer;
use crate::orchestrator::Orchestrator;
use crate::profiler::Profiler;
use githound_common::CorrelationId;
use githound_git::Repository;
use githound_index::IncrementalIndexer;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const DEFAULT_CACHE_SIZE: usize = 100;
const INDEX_FAST_PATH_LIMIT: usize = 200;

/// Canonical key for the whole-query result cache: the optimised query
/// serialised as JSON, plus branch.
fn cache_key(query: &SearchQuery, branch: Option<&str>) -> String {
    let json = serde_json::to_string(query).unwrap_or_default();
    format!("{}:{}", branch.unwrap_or("HEAD"), blake3::hash(json.as_bytes()).to_hex())
}

pub struct EnhancedOrchestrator {
    base: Orchestrator,
    optimizer: QueryOptimizer,
    cache: Mutex<LruCache<String, Vec<SearchResult>>>,
    profiler: Mutex<Profiler>,
}

impl EnhancedOrchestrator {
    #[must_use]
    pub fn new(base: Orchestrator) -> Self {
        Self::with_cache_size(base, DEFAULT_CACHE_SIZE)
    }

    #[must_use]
    pub fn with_cache_size(base: Orchestrator, cache_max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_max_size.max(1)).expect("capacity is nonzero");
        Self {
            base,
            optimizer: QueryOptimizer::new(),
            cache: Mutex::new(LruCache::new(capacity)),
            profiler: Mutex::new(Profiler::new()),
        }
    }

    #[must_use]
    pub fn profiler_snapshot(&self) -> Vec<crate::profiler::Bottleneck> {
        self.profiler.lock().unwrap_or_else(std::sync::PoisonError::into_inner).detect_bottlenecks(None)
    }

    /// Optimise the query, consult the whole-query cache, then try the
    /// index-driven fast path before falling back to the base
    /// orchestrator's full fan-out. Both the fast path and the fallback
    /// run through the base orchestrator's relevance engine and result
    /// processor, so ranking/post-filtering never depends on which path
    /// answered the query.
    #[tracing::instrument(skip(self, repo, indexer, progress, cache), fields(correlation_id = tracing::field::Empty))]
    #[allow(clippy::too_many_arguments)]
    pub async fn search(
        &self,
        repo: Arc<dyn Repository>,
        query: SearchQuery,
        branch: Option<String>,
        indexer: Option<&IncrementalIndexer>,
        progress: Option<Arc<ProgressCallback>>,
        cache: Option<Arc<githound_cache::SearchCache>>,
        max_results: Option<usize>,
    ) -> Result<(Vec<SearchResult>, Arc<SearchMetrics>)> {
        let correlation_id = CorrelationId::new();
        tracing::Span::current().record("correlation_id", tracing::field::display(&correlation_id));

        let query = self.optimizer.optimize(query);
        let key = cache_key(&query, branch.as_deref());

        let cache_start = Instant::now();
        if let Some(hit) = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(&key).cloned() {
            self.record_stage("cache_lookup", cache_start.elapsed());
            if let Some(progress) = &progress {
                progress("cache_lookup", 1.0);
            }
            return Ok((hit, Arc::new(SearchMetrics::new())));
        }
        self.record_stage("cache_lookup", cache_start.elapsed());

        if let (Some(indexer), Some(_)) = (indexer, &query.content_pattern) {
            let index_start = Instant::now();
            if let Some(results) =
                self.try_index_fast_path(indexer, &query, repo.as_ref(), max_results).await
            {
                self.record_stage("index_fast_path", index_start.elapsed());
                self.cache
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .put(key, results.clone());
                tracing::debug!(correlation_id = %correlation_id, path = "index_fast_path", "search completed");
                return Ok((results, Arc::new(SearchMetrics::new())));
            }
            self.record_stage("index_fast_path", index_start.elapsed());
        }

        let fallback_start = Instant::now();
        let (results, metrics) =
            self.base.search(repo, query, branch, progress, cache, max_results).await?;
        self.record_stage("base_orchestrator", fallback_start.elapsed());

        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .put(key, results.clone());
        self.profiler.lock().unwrap_or_else(std::sync::PoisonError::into_inner).record_search();
        tracing::debug!(correlation_id = %correlation_id, path = "base_orchestrator", "search completed");

        Ok((results, metrics))
    }

    async fn try_index_fast_path(
        &self,
        indexer: &IncrementalIndexer,
        query: &SearchQuery,
        repo: &dyn Repository,
        max_results: Option<usize>,
    ) -> Option<Vec<SearchResult>> {
        let pattern = query.content_pattern.as_deref()?;
        let limit = max_results.unwrap_or(INDEX_FAST_PATH_LIMIT).min(INDEX_FAST_PATH_LIMIT);
        let hits = indexer.search_content(pattern, limit);
        if hits.is_empty() {
            return None;
        }

        let mut results = Vec::with_capacity(hits.len());
        for (doc_id, score) in hits {
            let (hash, path) = doc_id.split_once(':')?;
            let commit = repo.commit(hash).await.ok().flatten()?;
            results.push(
                SearchResult::new(hash.to_string(), SearchType::Content, score)
                    .with_file_path(path.to_string())
                    .with_commit_info(CommitInfo::from(&commit)),
            );
        }
        Some(self.base.post_process(results, query, max_results))
    }

    fn record_stage(&self, name: &str, duration: std::time::Duration) {
        self.profiler.lock().unwrap_or_else(std::sync::PoisonError::into_inner).record_stage(name, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searchers::CommitHashSearcher;
    use chrono::Utc;
    use githound_git::{CommitData, MockRepository, PersonInfo};

    fn commit(hash: &str) -> CommitData {
        CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            committer: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            message: "work".into(),
            committed_date: 0,
            committed_datetime: Utc::now(),
            parents: vec![],
            files: Default::default(),
            total_insertions: 0,
            total_deletions: 0,
        }
    }

    #[tokio::test]
    async fn repeated_identical_query_hits_the_cache() {
        let mut base = Orchestrator::new();
        base.register_searcher(Arc::new(CommitHashSearcher::new())).unwrap();
        let enhanced = EnhancedOrchestrator::new(base);

        let repo = Arc::new(MockRepository::new().with_commit(commit("abc")));
        let query = SearchQuery { commit_hash: Some("abc".into()), ..SearchQuery::new() };

        let (first, _) = enhanced
            .search(repo.clone(), query.clone(), None, None, None, None, None)
            .await
            .unwrap();
        let (second, _) =
            enhanced.search(repo, query, None, None, None, None, None).await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first.len(), 1);
    }
}
