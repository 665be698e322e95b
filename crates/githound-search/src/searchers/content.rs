//! Matches file content changed in each commit, line by line.

use crate::line_matcher::scan_buffer;
use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::IterCommitsSpec;

const IMPORTANT_EXTENSIONS: &[&str] =
    &[".rs", ".py", ".js", ".ts", ".go", ".java", ".c", ".cpp", ".h", ".rb"];

#[derive(Default)]
pub struct ContentSearcher {
    metrics: SearcherMetrics,
}

impl ContentSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn include_excludes_allow(path: &str, include: &[String], exclude: &[String]) -> bool {
    if !include.is_empty() && !include.iter().any(|g| super::file_path::path_matches(g, path)) {
        return false;
    }
    if exclude.iter().any(|g| super::file_path::path_matches(g, path)) {
        return false;
    }
    true
}

fn path_depth(path: &str) -> usize {
    path.split('/').count()
}

fn has_important_extension(path: &str) -> bool {
    let lower = path.to_lowercase();
    IMPORTANT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn score(exact_substring: bool, path: &str) -> f64 {
    let mut score: f64 = 0.5;
    if exact_substring {
        score += 0.3;
    }
    if has_important_extension(path) {
        score += 0.1;
    }
    if path_depth(path) <= 3 {
        score += 0.1;
    }
    score.min(1.0)
}

#[async_trait]
impl Searcher for ContentSearcher {
    fn name(&self) -> &str {
        "content"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.content_pattern.is_some()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        let Some(pattern) = &context.query.content_pattern else {
            return Vec::new();
        };
        let query = &context.query;

        let spec = IterCommitsSpec {
            reference: context.branch.as_ref().map(|b| format!("refs/heads/{b}")),
            max_count: Some(context.max_results.unwrap_or(usize::MAX).min(DEFAULT_COMMIT_CAP)),
            ..IterCommitsSpec::default()
        };
        let Ok(commits) = context.repo.iter_commits(spec).await else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for commit in &commits {
            self.metrics.commits_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            for path in commit.files.keys() {
                if !include_excludes_allow(path, &query.include_globs, &query.exclude_globs) {
                    continue;
                }
                let Ok(Some(bytes)) = context.repo.read_blob(&commit.hexsha, path).await else {
                    continue;
                };
                if let Some(max_size) = query.max_file_size {
                    if bytes.len() as u64 > max_size {
                        continue;
                    }
                }
                self.metrics.files_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

                let matches = scan_buffer(&bytes, pattern, query.case_sensitive);
                for m in matches {
                    let exact_substring = if query.case_sensitive {
                        m.text.contains(pattern.as_str())
                    } else {
                        m.text.to_lowercase().contains(&pattern.to_lowercase())
                    };
                    self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    results.push(
                        SearchResult::new(
                            commit.hexsha.clone(),
                            SearchType::Content,
                            score(exact_substring, path),
                        )
                        .with_file_path(path.clone())
                        .with_line(m.line_number, m.text.clone())
                        .with_commit_info(CommitInfo::from(commit)),
                    );
                }
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
    use githound_git::{FileStat, MockRepository, PersonInfo};
    use std::sync::Arc;

    fn commit_with_file(hash: &str, path: &str) -> githound_git::CommitData {
        let mut files = std::collections::HashMap::new();
        files.insert(path.to_string(), FileStat::default());
        githound_git::CommitData {
            hexsha: hash.to_string(),
            author: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            committer: PersonInfo { name: "A".into(), email: "a@example.com".into() },
            message: "work".into(),
            committed_date: 0,
            committed_datetime: Utc::now(),
            parents: vec![],
            files,
            total_insertions: 0,
            total_deletions: 0,
        }
    }

    #[tokio::test]
    async fn finds_matching_lines_and_scores_important_files_higher() {
        let mut repo = MockRepository::new()
            .with_commit(commit_with_file("c1", "src/main.rs"))
            .with_commit(commit_with_file("c2", "docs/readme.txt"));
        repo = repo
            .with_blob("c1", "src/main.rs", b"fn main() {\n    handle_error();\n}\n".to_vec())
            .with_blob("c2", "docs/readme.txt", b"please handle_error cases\n".to_vec());
        let repo = Arc::new(repo);

        let query = SearchQuery {
            content_pattern: Some("handle_error".into()),
            ..SearchQuery::new()
        };
        let context = SearchContext::new(repo, query);

        let mut results = ContentSearcher::new().search(&context).await;
        assert_eq!(results.len(), 2);
        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        assert_eq!(results[0].file_path.as_deref(), Some("src/main.rs"));
        assert!(results[0].relevance_score > results[1].relevance_score);
    }

    #[tokio::test]
    async fn exclude_globs_filter_out_matches() {
        let mut repo = MockRepository::new().with_commit(commit_with_file("c1", "vendor/lib.rs"));
        repo = repo.with_blob("c1", "vendor/lib.rs", b"needle here\n".to_vec());
        let repo = Arc::new(repo);

        let query = SearchQuery {
            content_pattern: Some("needle".into()),
            exclude_globs: vec!["vendor/*".into()],
            ..SearchQuery::new()
        };
        let context = SearchContext::new(repo, query);

        let results = ContentSearcher::new().search(&context).await;
        assert!(results.is_empty());
    }
}
