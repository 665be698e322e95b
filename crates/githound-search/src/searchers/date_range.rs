//! Matches commits within an (optionally open-ended) date range.

use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::IterCommitsSpec;

#[derive(Default)]
pub struct DateRangeSearcher {
    metrics: SearcherMetrics,
}

impl DateRangeSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Searcher for DateRangeSearcher {
    fn name(&self) -> &str {
        "date_range"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.date_from.is_some() || query.date_to.is_some()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        if !self.can_handle(&context.query) {
            return Vec::new();
        }

        let spec = IterCommitsSpec {
            reference: context.branch.as_ref().map(|b| format!("refs/heads/{b}")),
            max_count: Some(context.max_results.unwrap_or(usize::MAX).min(50_000)),
            since: context.query.date_from,
            until: context.query.date_to,
            ..IterCommitsSpec::default()
        };
        let Ok(commits) = context.repo.iter_commits(spec).await else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for commit in &commits {
            self.metrics.commits_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            results.push(
                SearchResult::new(commit.hexsha.clone(), SearchType::DateRange, 1.0)
                    .with_commit_info(CommitInfo::from(commit)),
            );
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
    use chrono::{Duration, Utc};
    use githound_git::{MockRepository, PersonInfo};
    use std::sync::Arc;

    fn commit_on(hash: &str, days_ago: i64) -> githound_git::CommitData {
        githound_git::CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            committer: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            message: "work".into(),
            committed_date: 0,
            committed_datetime: Utc::now() - Duration::days(days_ago),
            parents: vec![],
            files: Default::default(),
            total_insertions: 0,
            total_deletions: 0,
        }
    }

    #[tokio::test]
    async fn open_ended_from_filters_older_commits() {
        let mut repo = MockRepository::new();
        for day in 0..10 {
            repo = repo.with_commit(commit_on(&format!("c{day}"), day));
        }
        let repo = Arc::new(repo);

        let query =
            SearchQuery { date_from: Some(Utc::now() - Duration::days(4)), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query.clone());

        let results = DateRangeSearcher::new().search(&context).await;
        assert_eq!(results.len(), 5);
        for r in &results {
            let date = r.commit_info.as_ref().unwrap().date;
            assert!(date >= query.date_from.unwrap());
        }
    }
}
