//! Single repository lookup by exact commit hash.

use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics};
use async_trait::async_trait;

#[derive(Default)]
pub struct CommitHashSearcher {
    metrics: SearcherMetrics,
}

impl CommitHashSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Searcher for CommitHashSearcher {
    fn name(&self) -> &str {
        "commit_hash"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.commit_hash.is_some()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        1
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        let Some(hash) = &context.query.commit_hash else {
            return Vec::new();
        };

        self.metrics.commits_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        match context.repo.commit(hash).await {
            Ok(Some(commit)) => {
                self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                vec![SearchResult::new(commit.hexsha.clone(), SearchType::CommitHash, 1.0)
                    .with_commit_info(CommitInfo::from(&commit))]
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, hash, "commit_hash searcher: repository lookup failed");
                Vec::new()
            }
        }
    }

    fn metrics(&self) -> &SearcherMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use githound_git::MockRepository;
    use std::sync::Arc;

    fn commit(hash: &str) -> githound_git::CommitData {
        use chrono::Utc;
        use githound_git::PersonInfo;
        githound_git::CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: "Alice".into(), email: "alice@example.com".into() },
            committer: PersonInfo { name: "Alice".into(), email: "alice@example.com".into() },
            message: "initial commit".into(),
            committed_date: 0,
            committed_datetime: Utc::now(),
            parents: vec![],
            files: Default::default(),
            total_insertions: 0,
            total_deletions: 0,
        }
    }

    #[tokio::test]
    async fn finds_exact_commit_with_full_relevance() {
        let repo = Arc::new(MockRepository::new().with_commit(commit("abc123")));
        let query = SearchQuery { commit_hash: Some("abc123".into()), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query);

        let searcher = CommitHashSearcher::new();
        assert!(searcher.can_handle(&context.query));
        let results = searcher.search(&context).await;
        assert_eq!(results.len(), 1);
        assert!((results[0].relevance_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(results[0].search_type, SearchType::CommitHash);
    }

    #[tokio::test]
    async fn unknown_hash_yields_nothing() {
        let repo = Arc::new(MockRepository::new());
        let query = SearchQuery { commit_hash: Some("missing".into()), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query);

        let results = CommitHashSearcher::new().search(&context).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn cannot_handle_query_without_commit_hash() {
        let searcher = CommitHashSearcher::new();
        assert!(!searcher.can_handle(&SearchQuery::new()));
    }
}
