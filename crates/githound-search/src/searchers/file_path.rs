//! Matches changed file paths by regex or glob across commit diffs,
//! deduplicating paths already yielded.

use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::IterCommitsSpec;
use regex::RegexBuilder;
use std::collections::HashSet;

#[derive(Default)]
pub struct FilePathSearcher {
    metrics: SearcherMetrics,
}

impl FilePathSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn path_matches(pattern: &str, path: &str) -> bool {
    if let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() {
        return re.is_match(path);
    }
    if let Ok(glob) = globset::Glob::new(pattern) {
        return glob.compile_matcher().is_match(path);
    }
    path.to_lowercase().contains(&pattern.to_lowercase())
}

#[async_trait]
impl Searcher for FilePathSearcher {
    fn name(&self) -> &str {
        "file_path"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        query.file_path_pattern.is_some()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        let Some(pattern) = &context.query.file_path_pattern else {
            return Vec::new();
        };

        let spec = IterCommitsSpec {
            reference: context.branch.as_ref().map(|b| format!("refs/heads/{b}")),
            max_count: Some(context.max_results.unwrap_or(usize::MAX).min(2000)),
            ..IterCommitsSpec::default()
        };
        let Ok(commits) = context.repo.iter_commits(spec).await else {
            return Vec::new();
        };

        let mut seen_paths = HashSet::new();
        let mut results = Vec::new();
        for commit in &commits {
            self.metrics.commits_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            for path in commit.files.keys() {
                if seen_paths.contains(path) {
                    continue;
                }
                if path_matches(pattern, path) {
                    seen_paths.insert(path.clone());
                    self.metrics.files_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    results.push(
                        SearchResult::new(commit.hexsha.clone(), SearchType::FilePath, 1.0)
                            .with_file_path(path.clone())
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

    fn commit_with_files(hash: &str, files: &[&str]) -> githound_git::CommitData {
        let files = files.iter().map(|f| ((*f).to_string(), FileStat::default())).collect();
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
    async fn matches_glob_and_dedupes_paths() {
        let repo = Arc::new(
            MockRepository::new()
                .with_commit(commit_with_files("c1", &["src/main.rs", "docs/readme.md"]))
                .with_commit(commit_with_files("c2", &["src/main.rs", "src/lib.rs"])),
        );
        let query = SearchQuery { file_path_pattern: Some("src/*.rs".into()), ..SearchQuery::new() };
        let context = SearchContext::new(repo, query);

        let results = FilePathSearcher::new().search(&context).await;
        let mut paths: Vec<_> = results.iter().map(|r| r.file_path.clone().unwrap()).collect();
        paths.sort();
        assert_eq!(paths, vec!["src/lib.rs".to_string(), "src/main.rs".to_string()]);
    }
}
