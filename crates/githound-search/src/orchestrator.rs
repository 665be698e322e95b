//! Fans a query out across registered searchers and merges the results.

use crate::error::{Result, SearchError};
use crate::model::{ProgressCallback, SearchContext, SearchMetrics, SearchQuery, SearchResult};
use crate::result_processor::ResultProcessor;
use crate::searcher::{Cacheable, Searcher, SEARCHER_CACHE_TTL};
use chrono::Utc;
use githound_common::CorrelationId;
use githound_git::Repository;
use githound_rank::{Bm25Ranker, RelevanceEngine, RelevanceInput, RelevanceWeights};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn to_relevance_weights(weights: &githound_config::RankingWeights) -> RelevanceWeights {
    RelevanceWeights {
        query_match: weights.query_match,
        recency: weights.recency,
        file_importance: weights.file_importance,
        author_relevance: weights.author_relevance,
        commit_quality: weights.commit_quality,
        context_relevance: weights.context_relevance,
        frequency: weights.frequency,
    }
}

fn file_extension(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or("")
}

/// Score every result with the seven-factor [`RelevanceEngine`], then (for
/// content queries) re-rank the content-bearing subset with [`Bm25Ranker`]
/// over the matched lines, blending its combined score in as the final
/// `relevance_score` per §4.4/§4.5.
fn apply_ranking(merged: &mut [SearchResult], query: &SearchQuery, weights: RelevanceWeights) {
    let total = merged.len();
    let mut file_counts: HashMap<String, usize> = HashMap::new();
    let mut type_counts: HashMap<String, usize> = HashMap::new();
    for result in merged.iter() {
        if let Some(path) = &result.file_path {
            *file_counts.entry(path.clone()).or_insert(0) += 1;
            *type_counts.entry(file_extension(path).to_string()).or_insert(0) += 1;
        }
    }

    let engine = RelevanceEngine::new(weights);
    for result in merged.iter_mut() {
        let (author_name, author_email, message, days_ago, files_changed) = match &result.commit_info {
            Some(info) => (
                info.author_name.as_str(),
                info.author_email.as_str(),
                info.message.as_str(),
                (Utc::now() - info.date).num_days().max(0),
                info.files_changed,
            ),
            None => ("", "", "", 0, 0),
        };
        let same_file_count =
            result.file_path.as_deref().map_or(0, |p| file_counts.get(p).copied().unwrap_or(1));
        let same_type_count = result
            .file_path
            .as_deref()
            .map_or(0, |p| type_counts.get(file_extension(p)).copied().unwrap_or(1));

        let input = RelevanceInput {
            query_content_pattern: query.content_pattern.as_deref(),
            query_author_pattern: query.author_pattern.as_deref(),
            query_message_pattern: query.message_pattern.as_deref(),
            fuzzy: query.fuzzy_search,
            matching_line: result.matching_line.as_deref(),
            author_name,
            author_email,
            message,
            file_path: result.file_path.as_deref(),
            days_ago,
            files_changed,
            content_pattern_in_context: result.search_type == crate::model::SearchType::Content,
            message_pattern_in_context: result.search_type == crate::model::SearchType::Message,
            analysis_type: None,
            same_file_count,
            same_type_count,
            total_results: total,
        };
        result.relevance_score = engine.score(&input);
    }

    if let Some(pattern) = &query.content_pattern {
        let documents: Vec<(String, String, f64)> = merged
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.matching_line.as_ref().map(|line| (i.to_string(), line.clone(), r.relevance_score)))
            .collect();
        if !documents.is_empty() {
            let mut ranker = Bm25Ranker::default();
            for (doc_id, score) in ranker.rank(&documents, pattern) {
                if let Ok(index) = doc_id.parse::<usize>() {
                    merged[index].relevance_score = score.clamp(0.0, 1.0);
                }
            }
        }
    }
}

/// Run `searcher` against `context`, consulting `context.cache` through the
/// blanket [`Cacheable`] impl first and recording the hit/miss on the
/// searcher's own [`crate::searcher::SearcherMetrics`].
async fn run_cached(searcher: &Arc<dyn Searcher>, context: &SearchContext) -> Vec<SearchResult> {
    let Some(cache) = &context.cache else {
        return searcher.search(context).await;
    };

    let key = searcher.cache_key(context, "results");
    if let Ok(Some(bytes)) = cache.get(&key).await {
        if let Ok(results) = serde_json::from_slice::<Vec<SearchResult>>(&bytes) {
            searcher.metrics().cache_hits.fetch_add(1, Ordering::Relaxed);
            context.metrics.record_cache_hit();
            return results;
        }
    }

    searcher.metrics().cache_misses.fetch_add(1, Ordering::Relaxed);
    context.metrics.record_cache_miss();
    let results = searcher.search(context).await;
    if let Ok(bytes) = serde_json::to_vec(&results) {
        let _ = cache.set(&key, bytes, Some(SEARCHER_CACHE_TTL)).await;
    }
    results
}

/// Owns the searcher registry and runs one query against it at a time
/// (mirrors the teacher's service-registration shape: register, look up
/// by name, list, unregister).
pub struct Orchestrator {
    searchers: Vec<Arc<dyn Searcher>>,
    ranking_weights: Option<RelevanceWeights>,
    result_processor: ResultProcessor,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self { searchers: Vec::new(), ranking_weights: None, result_processor: ResultProcessor::new() }
    }

    #[must_use]
    pub fn with_searchers(searchers: Vec<Arc<dyn Searcher>>) -> Self {
        Self { searchers, ranking_weights: None, result_processor: ResultProcessor::new() }
    }

    /// Build a registry from `config`, enabling the multi-factor relevance
    /// engine when `config.enable_ranking` is set, driven by
    /// `config.ranking_weights`.
    #[must_use]
    pub fn with_config(searchers: Vec<Arc<dyn Searcher>>, config: &githound_config::EngineConfig) -> Self {
        Self {
            searchers,
            ranking_weights: config.enable_ranking.then(|| to_relevance_weights(&config.ranking_weights)),
            result_processor: ResultProcessor::new(),
        }
    }

    /// Register a searcher under its own `name()`. Rejects a second
    /// registration under the same name.
    pub fn register_searcher(&mut self, searcher: Arc<dyn Searcher>) -> Result<()> {
        if self.searchers.iter().any(|s| s.name() == searcher.name()) {
            return Err(SearchError::DuplicateSearcher(searcher.name().to_string()));
        }
        self.searchers.push(searcher);
        Ok(())
    }

    pub fn unregister_searcher(&mut self, name: &str) {
        self.searchers.retain(|s| s.name() != name);
    }

    #[must_use]
    pub fn list_searchers(&self) -> Vec<&str> {
        self.searchers.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn get_searcher_by_name(&self, name: &str) -> Option<&Arc<dyn Searcher>> {
        self.searchers.iter().find(|s| s.name() == name)
    }

    /// Post-filter by commit size, score with the relevance engine (when
    /// enabled), sort, enrich, and paginate - the common tail shared by the
    /// base fan-out and the enhanced orchestrator's index fast path.
    pub(crate) fn post_process(
        &self,
        merged: Vec<SearchResult>,
        query: &SearchQuery,
        max_results: Option<usize>,
    ) -> Vec<SearchResult> {
        let mut merged = self.result_processor.post_filter(merged, query.min_commit_size, query.max_commit_size);

        if let Some(weights) = self.ranking_weights {
            apply_ranking(&mut merged, query, weights);
        }

        merged.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        let merged = self.result_processor.enrich(merged);
        self.result_processor.finalize(merged, 0, max_results)
    }

    /// Run `query` against every applicable registered searcher, merge,
    /// rank, and paginate to `max_results`. An empty (non-discriminating)
    /// query is rejected before any searcher runs, saving `O(searchers)`
    /// wasted `can_handle` calls.
    #[tracing::instrument(skip(self, repo, progress, cache), fields(searchers = self.searchers.len(), correlation_id = tracing::field::Empty))]
    pub async fn search(
        &self,
        repo: Arc<dyn Repository>,
        query: SearchQuery,
        branch: Option<String>,
        progress: Option<Arc<ProgressCallback>>,
        cache: Option<Arc<githound_cache::SearchCache>>,
        max_results: Option<usize>,
    ) -> Result<(Vec<SearchResult>, Arc<SearchMetrics>)> {
        let correlation_id = CorrelationId::new();
        tracing::Span::current().record("correlation_id", tracing::field::display(&correlation_id));

        if !query.is_discriminating() {
            return Err(SearchError::Repository(
                "query has no discriminating field set".to_string(),
            ));
        }

        let mut context = SearchContext::new(repo, query);
        context.branch = branch;
        context.progress = progress;
        context.cache = cache;
        context.max_results = max_results;

        let applicable: Vec<Arc<dyn Searcher>> = self
            .searchers
            .iter()
            .filter(|s| s.can_handle(&context.query))
            .cloned()
            .collect();

        let total = applicable.len().max(1);
        let handles: Vec<_> = applicable
            .into_iter()
            .map(|searcher| {
                let context = &context;
                async move {
                    let results = run_cached(&searcher, context).await;
                    (searcher.name().to_string(), results)
                }
            })
            .collect();

        let mut merged = Vec::new();
        let mut completed = 0usize;
        for (name, results) in futures::future::join_all(handles).await {
            completed += 1;
            merged.extend(results);
            context.report(&format!("Completed {name}"), completed as f64 / total as f64);
        }

        let merged = self.post_process(merged, &context.query, max_results);

        for _ in &merged {
            context.metrics.record_result();
        }
        tracing::debug!(correlation_id = %correlation_id, results = merged.len(), "search completed");
        context.report("Search completed", 1.0);

        Ok((merged, context.metrics.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searchers::{AuthorSearcher, CommitHashSearcher};
    use chrono::Utc;
    use githound_git::{CommitData, MockRepository, PersonInfo};

    fn commit(hash: &str, name: &str) -> CommitData {
        CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: name.into(), email: "a@example.com".into() },
            committer: PersonInfo { name: name.into(), email: "a@example.com".into() },
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
    async fn rejects_empty_query_before_dispatch() {
        let orchestrator = Orchestrator::new();
        let repo = Arc::new(MockRepository::new());
        let result = orchestrator.search(repo, SearchQuery::new(), None, None, None, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn merges_and_sorts_across_searchers() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_searcher(Arc::new(CommitHashSearcher::new())).unwrap();
        orchestrator.register_searcher(Arc::new(AuthorSearcher::new())).unwrap();

        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit("hash1", "Alice"))
                .with_commit(commit("hash2", "Bob")),
        );
        let query = SearchQuery {
            commit_hash: Some("hash1".into()),
            author_pattern: Some("Alice".into()),
            ..SearchQuery::new()
        };

        let (results, metrics) =
            orchestrator.search(repo, query, None, None, None, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(metrics.results_found.load(std::sync::atomic::Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn rejects_duplicate_searcher_names() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_searcher(Arc::new(CommitHashSearcher::new())).unwrap();
        assert!(orchestrator.register_searcher(Arc::new(CommitHashSearcher::new())).is_err());
    }

    #[tokio::test]
    async fn ranking_engine_rescoes_results_when_enabled() {
        let config = githound_config::EngineConfig::default();
        let mut orchestrator =
            Orchestrator::with_config(Vec::new(), &config);
        orchestrator.register_searcher(Arc::new(AuthorSearcher::new())).unwrap();

        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit("hash1", "Alice Developer"))
                .with_commit(commit("hash2", "Alice Developer")),
        );
        let query = SearchQuery { author_pattern: Some("Alice".into()), ..SearchQuery::new() };
        let (results, _) = orchestrator.search(repo, query, None, None, None, None).await.unwrap();

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!((0.0..=1.0).contains(&result.relevance_score));
            assert!(result.match_context.is_some());
        }
    }

    #[tokio::test]
    async fn per_searcher_cache_is_consulted_on_repeat_queries() {
        use githound_cache::{MemoryBackend, SearchCache};

        let mut orchestrator = Orchestrator::new();
        let searcher = Arc::new(AuthorSearcher::new());
        orchestrator.register_searcher(searcher.clone()).unwrap();

        let repo = Arc::new(MockRepository::new().with_commit(commit("hash1", "Alice")));
        let query = SearchQuery { author_pattern: Some("Alice".into()), ..SearchQuery::new() };
        let cache = Arc::new(SearchCache::new(Arc::new(MemoryBackend::new(10, None))));

        orchestrator
            .search(repo.clone(), query.clone(), None, None, Some(cache.clone()), None)
            .await
            .unwrap();
        orchestrator.search(repo, query, None, None, Some(cache), None).await.unwrap();

        assert_eq!(searcher.metrics().cache_misses.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(searcher.metrics().cache_hits.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
