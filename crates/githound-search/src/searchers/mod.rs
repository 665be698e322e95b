//! Concrete searchers, one per query axis (§4.1.1).

mod advanced;
mod author;
mod commit_hash;
mod content;
mod date_range;
mod file_path;
mod file_type;
mod fuzzy;
mod message;

pub use advanced::AdvancedSearcher;
pub use author::AuthorSearcher;
pub use commit_hash::CommitHashSearcher;
pub use content::ContentSearcher;
pub use date_range::DateRangeSearcher;
pub use file_path::FilePathSearcher;
pub use file_type::FileTypeSearcher;
pub use fuzzy::FuzzySearcher;
pub use message::MessageSearcher;

/// Build the default searcher set, honoring `enable_basic_searchers`/
/// `enable_advanced_searchers`/`enable_fuzzy_search` the way
/// `githound_config::EngineConfig` names them.
#[must_use]
pub fn default_searchers(config: &githound_config::EngineConfig) -> Vec<std::sync::Arc<dyn crate::searcher::Searcher>> {
    let mut searchers: Vec<std::sync::Arc<dyn crate::searcher::Searcher>> = Vec::new();

    if config.enable_basic_searchers {
        searchers.push(std::sync::Arc::new(CommitHashSearcher::new()));
        searchers.push(std::sync::Arc::new(AuthorSearcher::new()));
        searchers.push(std::sync::Arc::new(MessageSearcher::new()));
        searchers.push(std::sync::Arc::new(DateRangeSearcher::new()));
        searchers.push(std::sync::Arc::new(FilePathSearcher::new()));
        searchers.push(std::sync::Arc::new(FileTypeSearcher::new()));
        searchers.push(std::sync::Arc::new(ContentSearcher::new()));
    }

    if config.enable_fuzzy_search {
        searchers.push(std::sync::Arc::new(FuzzySearcher::new()));
    }

    if config.enable_advanced_searchers {
        searchers.push(std::sync::Arc::new(AdvancedSearcher::new(searchers.clone())));
    }

    searchers
}
