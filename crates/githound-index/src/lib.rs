//! Term-level inverted indexes over commit content, messages, and
//! author identities, and the incremental indexer that keeps them in
//! sync with a repository's history without re-walking already-indexed
//! commits.

mod error;
mod incremental;
mod inverted_index;

pub use error::IndexError;
pub use error::Result as IndexResult;
pub use incremental::{
    default_cache_dir, BuildStats, BuildStatus, IncrementalIndexer, IndexKind, ProgressFn,
};
pub use inverted_index::{DocMetadata, IndexStats, InvertedIndex, Posting};
