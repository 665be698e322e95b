//! Relevance ranking for githound search results
//!
//! Two independent scorers compose the final relevance score: [`Bm25Ranker`]
//! (probabilistic relevance over an ad-hoc document batch) and
//! [`RelevanceEngine`] (a multi-factor weighted scorer). Both share a single
//! [`tokenize`] function with the inverted index, so term extraction never
//! drifts between indexing and ranking.

pub mod bm25;
pub mod relevance;
pub mod tokenize;

pub use bm25::Bm25Ranker;
pub use relevance::{partial_ratio, RelevanceEngine, RelevanceInput, RelevanceWeights};
pub use tokenize::tokenize;
