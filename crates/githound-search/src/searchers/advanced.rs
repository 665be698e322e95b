//! Runs the other registered searchers concurrently for multi-criteria
//! queries and keeps only results every applicable delegate agreed on,
//! keyed by `(commit_hash, file_path)` - a true set intersection, not a
//! union with a tie-breaking boost.

use crate::model::{SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Parallel, Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Minimum number of discriminating criteria before this searcher kicks
/// in - below that, a single-axis searcher already covers the query.
const MIN_CRITERIA: usize = 2;

/// Boost applied to a surviving intersected result, capped at full
/// relevance.
const MULTI_MATCH_BOOST: f64 = 1.2;

pub struct AdvancedSearcher {
    delegates: Vec<Arc<dyn Searcher>>,
    metrics: SearcherMetrics,
}

impl AdvancedSearcher {
    #[must_use]
    pub fn new(delegates: Vec<Arc<dyn Searcher>>) -> Self {
        Self { delegates, metrics: SearcherMetrics::default() }
    }

    fn intersection_key(result: &SearchResult) -> (String, Option<String>) {
        (result.commit_hash.clone(), result.file_path.clone())
    }
}

#[async_trait]
impl Searcher for AdvancedSearcher {
    fn name(&self) -> &str {
        "advanced"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.criteria_count() >= MIN_CRITERIA
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64 * self.delegates.len().max(1) as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        if !self.can_handle(&context.query) {
            return Vec::new();
        }

        let applicable: Vec<&Arc<dyn Searcher>> =
            self.delegates.iter().filter(|d| d.can_handle(&context.query)).collect();
        if applicable.is_empty() {
            return Vec::new();
        }

        let parallel = Parallel::new(applicable.len().max(1));
        let futures = applicable.iter().map(|delegate| {
            let delegate = Arc::clone(delegate);
            parallel.run(move || async move { delegate.search(context).await })
        });
        let per_searcher = futures::future::join_all(futures).await;

        let mut merged: HashMap<(String, Option<String>), SearchResult> = HashMap::new();
        let mut match_counts: HashMap<(String, Option<String>), usize> = HashMap::new();
        for results in per_searcher {
            for result in results {
                let key = Self::intersection_key(&result);
                *match_counts.entry(key.clone()).or_insert(0) += 1;
                merged
                    .entry(key)
                    .and_modify(|existing| {
                        if result.relevance_score > existing.relevance_score {
                            *existing = result.clone();
                        }
                    })
                    .or_insert(result);
            }
        }

        let intersected: Vec<SearchResult> = merged
            .into_iter()
            .filter(|(key, _)| match_counts.get(key).copied().unwrap_or(0) > 1)
            .map(|(_, mut result)| {
                result.relevance_score = (result.relevance_score * MULTI_MATCH_BOOST).min(1.0);
                result.search_type = SearchType::Combined;
                result
            })
            .collect();

        self.metrics
            .results_found
            .fetch_add(intersected.len() as u64, std::sync::atomic::Ordering::Relaxed);

        intersected
    }

    fn metrics(&self) -> &SearcherMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searchers::author::AuthorSearcher;
    use crate::searchers::message::MessageSearcher;
    use chrono::Utc;
    use githound_git::{MockRepository, PersonInfo};

    fn commit(hash: &str, name: &str, message: &str) -> githound_git::CommitData {
        githound_git::CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: name.into(), email: "a@example.com".into() },
            committer: PersonInfo { name: name.into(), email: "a@example.com".into() },
            message: message.into(),
            committed_date: 0,
            committed_datetime: Utc::now(),
            parents: vec![],
            files: Default::default(),
            total_insertions: 0,
            total_deletions: 0,
        }
    }

    #[tokio::test]
    async fn intersects_commits_matched_by_every_criterion() {
        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit("a1", "Alice Developer", "Fix the login bug"))
                .with_commit(commit("a2", "Alice Developer", "Unrelated docs tweak"))
                .with_commit(commit("b1", "Bob Developer", "Fix the login bug")),
        );
        let query = SearchQuery {
            author_pattern: Some("Alice".into()),
            message_pattern: Some("login bug".into()),
            ..SearchQuery::new()
        };
        let context = SearchContext::new(repo, query);

        let delegates: Vec<Arc<dyn Searcher>> =
            vec![Arc::new(AuthorSearcher::new()), Arc::new(MessageSearcher::new())];
        let results = AdvancedSearcher::new(delegates).search(&context).await;

        // Only "a1" matches both the author and message searchers; "a2"
        // (author only) and "b1" (message only) are dropped by the
        // intersection.
        assert_eq!(results.len(), 1);
        let boosted = &results[0];
        assert_eq!(boosted.commit_hash, "a1");
        assert!((boosted.relevance_score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn refuses_single_criterion_queries() {
        let repo = Arc::new(MockRepository::new());
        let query = SearchQuery { author_pattern: Some("Alice".into()), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query);
        let delegates: Vec<Arc<dyn Searcher>> = vec![Arc::new(AuthorSearcher::new())];
        assert!(!AdvancedSearcher::new(delegates).can_handle(&context.query));
    }
}
