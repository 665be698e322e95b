//! Immutable request/response carriers and per-invocation scratch state.

use chrono::{DateTime, Utc};
use githound_git::{CommitData, Repository};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A structured search request. At least one discriminating field must
/// be set; an all-empty query matches nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub content_pattern: Option<String>,
    pub commit_hash: Option<String>,
    pub author_pattern: Option<String>,
    pub message_pattern: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub file_path_pattern: Option<String>,
    pub file_extensions: Vec<String>,
    pub case_sensitive: bool,
    pub fuzzy_search: bool,
    pub fuzzy_threshold: f64,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub max_file_size: Option<u64>,
    pub min_commit_size: Option<usize>,
    pub max_commit_size: Option<usize>,

    pub branch_analysis: bool,
    pub diff_analysis: bool,
    pub pattern_analysis: bool,
    pub statistical_analysis: bool,
    pub temporal_analysis: bool,
    pub tag_analysis: bool,
}

impl SearchQuery {
    #[must_use]
    pub fn new() -> Self {
        Self { fuzzy_threshold: 0.8, ..Self::default() }
    }

    /// Whether at least one discriminating field is set.
    #[must_use]
    pub fn is_discriminating(&self) -> bool {
        self.content_pattern.is_some()
            || self.commit_hash.is_some()
            || self.author_pattern.is_some()
            || self.message_pattern.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.file_path_pattern.is_some()
            || !self.file_extensions.is_empty()
    }

    /// How many of the primary criteria (content/commit/author/message/
    /// date/path/extensions) are set - used by the `advanced` searcher
    /// and the planner's selectivity ordering.
    #[must_use]
    pub fn criteria_count(&self) -> usize {
        [
            self.content_pattern.is_some(),
            self.commit_hash.is_some(),
            self.author_pattern.is_some(),
            self.message_pattern.is_some(),
            self.date_from.is_some() || self.date_to.is_some(),
            self.file_path_pattern.is_some(),
            !self.file_extensions.is_empty(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Which axis of the query produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Content,
    CommitHash,
    Author,
    Message,
    DateRange,
    FilePath,
    FileType,
    Combined,
}

/// A denormalised snapshot of one commit, carried alongside results so
/// callers don't need to round-trip to the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub short_hash: String,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub parents: Vec<String>,
}

impl From<&CommitData> for CommitInfo {
    fn from(c: &CommitData) -> Self {
        Self {
            hash: c.hexsha.clone(),
            short_hash: c.short_hash().to_string(),
            author_name: c.author.name.clone(),
            author_email: c.author.email.clone(),
            committer_name: c.committer.name.clone(),
            committer_email: c.committer.email.clone(),
            message: c.message.trim().to_string(),
            date: c.committed_datetime,
            files_changed: c.files_changed(),
            insertions: c.total_insertions,
            deletions: c.total_deletions,
            parents: c.parents.clone(),
        }
    }
}

/// One match produced by a searcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub commit_hash: String,
    pub file_path: Option<String>,
    pub line_number: Option<usize>,
    pub matching_line: Option<String>,
    pub search_type: SearchType,
    pub relevance_score: f64,
    pub commit_info: Option<CommitInfo>,
    pub match_context: Option<HashMap<String, String>>,
    pub search_time_ms: Option<u64>,
}

impl SearchResult {
    #[must_use]
    pub fn new(commit_hash: impl Into<String>, search_type: SearchType, relevance_score: f64) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            file_path: None,
            line_number: None,
            matching_line: None,
            search_type,
            relevance_score: relevance_score.clamp(0.0, 1.0),
            commit_info: None,
            match_context: None,
            search_time_ms: None,
        }
    }

    #[must_use]
    pub fn with_commit_info(mut self, info: CommitInfo) -> Self {
        self.commit_info = Some(info);
        self
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_line(mut self, line_number: usize, matching_line: impl Into<String>) -> Self {
        self.line_number = Some(line_number);
        self.matching_line = Some(matching_line.into());
        self
    }
}

/// Strictly monotonic counters for one orchestration invocation.
#[derive(Debug, Default)]
pub struct SearchMetrics {
    pub commits_searched: AtomicU64,
    pub files_searched: AtomicU64,
    pub results_found: AtomicU64,
    pub duration_ms: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub peak_memory_mb: AtomicU64,
}

impl SearchMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&self) {
        self.commits_searched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file(&self) {
        self.files_searched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result(&self) {
        self.results_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SearchMetricsSnapshot {
        SearchMetricsSnapshot {
            commits_searched: self.commits_searched.load(Ordering::Relaxed),
            files_searched: self.files_searched.load(Ordering::Relaxed),
            results_found: self.results_found.load(Ordering::Relaxed),
            duration_ms: self.duration_ms.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            peak_memory_mb: self.peak_memory_mb.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time, `Serialize`-able copy of [`SearchMetrics`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SearchMetricsSnapshot {
    pub commits_searched: u64,
    pub files_searched: u64,
    pub results_found: u64,
    pub duration_ms: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub peak_memory_mb: u64,
}

/// A progress callback: `(message, fraction complete in [0,1])`. Must be
/// non-blocking; the orchestrator may drop calls under backpressure.
pub type ProgressCallback = dyn Fn(&str, f64) + Send + Sync;

/// Per-query scratch state: the repository handle, the query, and the
/// optional branch/progress/cache collaborators. Lives for exactly one
/// orchestrator invocation.
pub struct SearchContext {
    pub repo: Arc<dyn Repository>,
    pub query: SearchQuery,
    pub branch: Option<String>,
    pub progress: Option<Arc<ProgressCallback>>,
    pub cache: Option<Arc<githound_cache::SearchCache>>,
    pub max_results: Option<usize>,
    pub metrics: Arc<SearchMetrics>,
}

impl SearchContext {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, query: SearchQuery) -> Self {
        Self {
            repo,
            query,
            branch: None,
            progress: None,
            cache: None,
            max_results: None,
            metrics: Arc::new(SearchMetrics::new()),
        }
    }

    pub fn report(&self, message: &str, fraction: f64) {
        if let Some(progress) = &self.progress {
            progress(message, fraction.clamp(0.0, 1.0));
        }
    }
}
