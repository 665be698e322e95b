//! Orchestration-level error types.
//!
//! Per-commit and per-file failures inside a searcher are logged and
//! skipped rather than surfaced here (§7): this type only covers the
//! handful of failures that can legitimately stop a whole invocation.

use githound_common::define_error_enum;

define_error_enum! {
    pub enum SearchError {
        #[error("repository error: {0}")]
        Repository(String),

        #[error("invalid repository handle: {0}")]
        InvalidRepository(String),

        #[error("search timed out after {0}s")]
        Timeout(u64),

        #[error("cancelled: {0}")]
        Cancelled(String),

        #[error("duplicate searcher registered: {0}")]
        DuplicateSearcher(String),
    }
}

impl From<githound_git::GitError> for SearchError {
    fn from(e: githound_git::GitError) -> Self {
        Self::Repository(e.to_string())
    }
}
