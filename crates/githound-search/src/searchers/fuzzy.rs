//! Fuzzy matching across content, message and author in one pass, for
//! queries that opt into approximate matching explicitly.

use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::{CommitData, IterCommitsSpec};

const MAX_CONTENT_LINES: usize = 10_000;
const MAX_RESULTS: usize = 100;
const MAX_BLOB_BYTES: usize = 1024 * 1024;

#[derive(Default)]
pub struct FuzzySearcher {
    metrics: SearcherMetrics,
}

impl FuzzySearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn score_commit(
        &self,
        repo: &dyn githound_git::Repository,
        commit: &CommitData,
        query: &SearchQuery,
        threshold: f64,
        lines_budget: &mut usize,
    ) -> Vec<SearchResult> {
        let mut out = Vec::new();

        if let Some(pattern) = &query.message_pattern {
            let score = githound_rank::partial_ratio(pattern, &commit.message);
            if score >= threshold {
                out.push(
                    SearchResult::new(commit.hexsha.clone(), SearchType::Message, score)
                        .with_commit_info(CommitInfo::from(commit)),
                );
            }
        }

        if let Some(pattern) = &query.author_pattern {
            let haystack = format!("{} {}", commit.author.name, commit.author.email);
            let score = githound_rank::partial_ratio(pattern, &haystack);
            if score >= threshold {
                out.push(
                    SearchResult::new(commit.hexsha.clone(), SearchType::Author, score)
                        .with_commit_info(CommitInfo::from(commit)),
                );
            }
        }

        if let Some(pattern) = &query.content_pattern {
            for path in commit.files.keys() {
                if *lines_budget == 0 {
                    break;
                }
                let Ok(Some(bytes)) = repo.read_blob(&commit.hexsha, path).await else {
                    continue;
                };
                if bytes.len() > MAX_BLOB_BYTES {
                    continue;
                }
                let text = String::from_utf8_lossy(&bytes);
                for (line_idx, line) in text.lines().enumerate() {
                    if *lines_budget == 0 {
                        break;
                    }
                    *lines_budget -= 1;
                    let score = githound_rank::partial_ratio(pattern, line);
                    if score >= threshold {
                        out.push(
                            SearchResult::new(commit.hexsha.clone(), SearchType::Content, score)
                                .with_file_path(path.clone())
                                .with_line(line_idx + 1, line.to_string())
                                .with_commit_info(CommitInfo::from(commit)),
                        );
                    }
                }
            }
        }

        out
    }
}

#[async_trait]
impl Searcher for FuzzySearcher {
    fn name(&self) -> &str {
        "fuzzy"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.fuzzy_search
            && (query.content_pattern.is_some()
                || query.message_pattern.is_some()
                || query.author_pattern.is_some())
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64 * 2
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        if !self.can_handle(&context.query) {
            return Vec::new();
        }
        let threshold = context.query.fuzzy_threshold;

        let spec = IterCommitsSpec {
            reference: context.branch.as_ref().map(|b| format!("refs/heads/{b}")),
            max_count: Some(context.max_results.unwrap_or(usize::MAX).min(DEFAULT_COMMIT_CAP)),
            ..IterCommitsSpec::default()
        };
        let Ok(commits) = context.repo.iter_commits(spec).await else {
            return Vec::new();
        };

        let mut lines_budget = MAX_CONTENT_LINES;
        let mut results = Vec::new();
        for commit in &commits {
            self.metrics.commits_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            let found = self
                .score_commit(
                    context.repo.as_ref(),
                    commit,
                    &context.query,
                    threshold,
                    &mut lines_budget,
                )
                .await;
            self.metrics
                .results_found
                .fetch_add(found.len() as u64, std::sync::atomic::Ordering::Relaxed);
            results.extend(found);
            if results.len() >= MAX_RESULTS {
                break;
            }
        }

        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        results.truncate(MAX_RESULTS);
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

    fn commit(hash: &str, message: &str) -> CommitData {
        CommitData {
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
    async fn results_meet_the_configured_threshold() {
        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit("a1", "Fix database connction pool"))
                .with_commit(commit("a2", "Unrelated change entirely")),
        );
        let query = SearchQuery {
            message_pattern: Some("fix database connection pool".into()),
            fuzzy_search: true,
            fuzzy_threshold: 0.75,
            ..SearchQuery::new()
        };
        let context = SearchContext::new(repo, query.clone());

        let results = FuzzySearcher::new().search(&context).await;
        assert!(!results.is_empty());
        for r in &results {
            assert!(r.relevance_score >= query.fuzzy_threshold);
        }
    }

    #[tokio::test]
    async fn ignores_query_when_fuzzy_disabled() {
        let repo = Arc::new(MockRepository::new().with_commit(commit("a1", "Fix thing")));
        let query = SearchQuery { message_pattern: Some("fix thing".into()), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query);

        let results = FuzzySearcher::new().search(&context).await;
        assert!(results.is_empty());
    }
}
