//! Matches commits by message text, regex or fuzzy partial-ratio.

use super::author::match_score;
use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::IterCommitsSpec;

#[derive(Default)]
pub struct MessageSearcher {
    metrics: SearcherMetrics,
}

impl MessageSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Searcher for MessageSearcher {
    fn name(&self) -> &str {
        "message"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.message_pattern.is_some()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        let Some(pattern) = &context.query.message_pattern else {
            return Vec::new();
        };

        let spec = IterCommitsSpec {
            reference: context.branch.as_ref().map(|b| format!("refs/heads/{b}")),
            max_count: Some(context.max_results.unwrap_or(usize::MAX).min(50_000)),
            ..IterCommitsSpec::default()
        };
        let Ok(commits) = context.repo.iter_commits(spec).await else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for commit in &commits {
            self.metrics.commits_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            if let Some(score) = match_score(
                pattern,
                &commit.message,
                context.query.fuzzy_search,
                context.query.fuzzy_threshold,
            ) {
                self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                results.push(
                    SearchResult::new(commit.hexsha.clone(), SearchType::Message, score)
                        .with_commit_info(CommitInfo::from(commit)),
                );
            }
        }
        results
    }

    fn metrics(&self) -> &SearcherMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use githound_git::{MockRepository, PersonInfo};
    use std::sync::Arc;

    fn commit(hash: &str, message: &str) -> githound_git::CommitData {
        githound_git::CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            committer: PersonInfo { name: "A".into(), email: "a@example.com".into() },
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
    async fn fuzzy_mode_favors_exact_match_over_typo() {
        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit("a1", "Implement search"))
                .with_commit(commit("a2", "Implment serach"))
                .with_commit(commit("a3", "Refactor tests")),
        );
        let query = SearchQuery {
            message_pattern: Some("implement search".into()),
            fuzzy_search: true,
            fuzzy_threshold: 0.7,
            ..SearchQuery::new()
        };
        let context = SearchContext::new(repo, query);

        let mut results = MessageSearcher::new().search(&context).await;
        assert_eq!(results.len(), 2);
        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        assert_eq!(results[0].commit_hash, "a1");
        assert!(results[0].relevance_score > results[1].relevance_score);
    }
}
