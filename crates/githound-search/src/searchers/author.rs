//! Matches commits by author name/email, regex or fuzzy partial-ratio.

use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::IterCommitsSpec;
use regex::RegexBuilder;

#[derive(Default)]
pub struct AuthorSearcher {
    metrics: SearcherMetrics,
}

impl AuthorSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Either an exact regex/substring match, or (in fuzzy mode) a
/// partial-ratio score `>= fuzzy_threshold`. Returns `None` on no match.
pub(crate) fn match_score(pattern: &str, haystack: &str, fuzzy: bool, fuzzy_threshold: f64) -> Option<f64> {
    if let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() {
        if re.is_match(haystack) {
            return Some(1.0);
        }
    } else if haystack.to_lowercase().contains(&pattern.to_lowercase()) {
        return Some(1.0);
    }

    if fuzzy {
        let score = githound_rank::partial_ratio(pattern, haystack);
        if score >= fuzzy_threshold {
            return Some(score);
        }
    }
    None
}

#[async_trait]
impl Searcher for AuthorSearcher {
    fn name(&self) -> &str {
        "author"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.author_pattern.is_some()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        let Some(pattern) = &context.query.author_pattern else {
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
            let haystack = format!("{} {}", commit.author.name, commit.author.email);
            if let Some(score) = match_score(
                pattern,
                &haystack,
                context.query.fuzzy_search,
                context.query.fuzzy_threshold,
            ) {
                self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                results.push(
                    SearchResult::new(commit.hexsha.clone(), SearchType::Author, score)
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

    fn commit(hash: &str, name: &str, email: &str) -> githound_git::CommitData {
        githound_git::CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: name.into(), email: email.into() },
            committer: PersonInfo { name: name.into(), email: email.into() },
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
    async fn matches_only_author_substring() {
        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit("a1", "Alice Developer", "alice@example.com"))
                .with_commit(commit("a2", "Alice Developer", "alice@example.com"))
                .with_commit(commit("a3", "Alice Developer", "alice@example.com"))
                .with_commit(commit("b1", "Bob Developer", "bob@example.com"))
                .with_commit(commit("b2", "Bob Developer", "bob@example.com")),
        );
        let query = SearchQuery { author_pattern: Some("Alice".into()), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query);

        let results = AuthorSearcher::new().search(&context).await;
        assert_eq!(results.len(), 3);
        for r in &results {
            assert!((r.relevance_score - 1.0).abs() < f64::EPSILON);
            assert_eq!(r.commit_info.as_ref().unwrap().author_name, "Alice Developer");
        }
    }

    #[tokio::test]
    async fn fuzzy_mode_catches_typos_above_threshold() {
        let repo = Arc::new(MockRepository::new().with_commit(commit("a1", "Alise Develper", "a@example.com")));
        let query = SearchQuery {
            author_pattern: Some("Alice Developer".into()),
            fuzzy_search: true,
            fuzzy_threshold: 0.6,
            ..SearchQuery::new()
        };
        let context = SearchContext::new(repo, query);

        let results = AuthorSearcher::new().search(&context).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].relevance_score >= 0.6);
    }
}
