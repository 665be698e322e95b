//! Multi-axis search over a Git repository's commit history.
//!
//! A [`Searcher`] matches one axis of a [`SearchQuery`] (commit hash,
//! author, message, date range, file path/type, content, fuzzy, or the
//! multi-criteria `advanced` combination). An [`Orchestrator`] fans a
//! query out across the registered searchers and merges the results by
//! relevance; [`EnhancedOrchestrator`] adds a whole-query cache and an
//! index-driven fast path on top.

pub mod enhanced;
pub mod error;
pub mod line_matcher;
pub mod model;
pub mod optimize;
pub mod orchestrator;
pub mod plan;
pub mod profiler;
pub mod result_processor;
pub mod searcher;
pub mod searchers;

pub use enhanced::EnhancedOrchestrator;
pub use error::{Result, SearchError};
pub use line_matcher::{contains_pattern, scan_buffer, LineMatch};
pub use model::{
    CommitInfo, ProgressCallback, SearchContext, SearchMetrics, SearchMetricsSnapshot, SearchQuery,
    SearchResult, SearchType,
};
pub use optimize::QueryOptimizer;
pub use orchestrator::Orchestrator;
pub use plan::Planner;
pub use profiler::{Bottleneck, Percentiles, Profiler, Severity};
pub use result_processor::ResultProcessor;
pub use searcher::{Cacheable, Parallel, Searcher, SearcherMetrics, DEFAULT_COMMIT_CAP, SEARCHER_CACHE_TTL};
pub use searchers::default_searchers;
