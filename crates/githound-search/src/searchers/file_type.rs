//! Matches changed files by extension, same commit walk as `file_path`.

use crate::model::{CommitInfo, SearchContext, SearchQuery, SearchResult, SearchType};
use crate::searcher::{Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP};
use async_trait::async_trait;
use githound_git::IterCommitsSpec;
use std::collections::HashSet;

#[derive(Default)]
pub struct FileTypeSearcher {
    metrics: SearcherMetrics,
}

impl FileTypeSearcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Normalise a configured extension to the `.ext` form used for
/// comparison, regardless of whether the caller included the dot.
fn normalise_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

fn file_extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.rfind('.').map(|idx| file_name[idx..].to_lowercase())
}

#[async_trait]
impl Searcher for FileTypeSearcher {
    fn name(&self) -> &str {
        "file_type"
    }

    fn can_handle(&self, query: &SearchQuery) -> bool {
        !query.file_extensions.is_empty()
    }

    fn estimate_work(&self, _context: &SearchContext) -> u64 {
        DEFAULT_COMMIT_CAP as u64
    }

    async fn search(&self, context: &SearchContext) -> Vec<SearchResult> {
        if context.query.file_extensions.is_empty() {
            return Vec::new();
        }
        let wanted: HashSet<String> =
            context.query.file_extensions.iter().map(|e| normalise_extension(e)).collect();

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
                let Some(ext) = file_extension(path) else {
                    continue;
                };
                if wanted.contains(&ext) {
                    seen_paths.insert(path.clone());
                    self.metrics.files_searched.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    self.metrics.results_found.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    results.push(
                        SearchResult::new(commit.hexsha.clone(), SearchType::FileType, 1.0)
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
