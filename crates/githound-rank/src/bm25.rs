//! BM25 ranking over an ad-hoc, in-memory document set.
//!
//! Deliberately domain-oblivious: callers hand in `(doc_id, text)` pairs
//! rather than any search-specific result type, so this crate has no
//! dependency on the searcher/orchestrator model.

use crate::tokenize::tokenize;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const IDF_CACHE_CAPACITY: usize = 4096;

/// A BM25 scorer over whatever document batch was last indexed.
pub struct Bm25Ranker {
    k1: f64,
    b: f64,
    doc_freqs: HashMap<String, u32>,
    doc_lengths: HashMap<String, usize>,
    avg_doc_length: f64,
    num_docs: usize,
    idf_cache: Mutex<LruCache<String, f64>>,
}

impl Default for Bm25Ranker {
    fn default() -> Self {
        Self::new(1.5, 0.75)
    }
}

impl Bm25Ranker {
    #[must_use]
    pub fn new(k1: f64, b: f64) -> Self {
        Self {
            k1: k1.clamp(1.2, 2.0),
            b: b.clamp(0.5, 0.8),
            doc_freqs: HashMap::new(),
            doc_lengths: HashMap::new(),
            avg_doc_length: 0.0,
            num_docs: 0,
            idf_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(IDF_CACHE_CAPACITY).expect("nonzero capacity"),
            )),
        }
    }

    /// Replace the indexed document set with `docs` and recompute stats.
    #[tracing::instrument(skip(self, docs), fields(doc_count = docs.len()))]
    pub fn index_documents(&mut self, docs: &[(String, String)]) {
        self.doc_freqs.clear();
        self.doc_lengths.clear();

        let mut total_length = 0usize;
        for (doc_id, text) in docs {
            let tokens = tokenize(text);
            self.doc_lengths.insert(doc_id.clone(), tokens.len());
            total_length += tokens.len();

            let unique: std::collections::HashSet<_> = tokens.into_iter().collect();
            for term in unique {
                *self.doc_freqs.entry(term).or_insert(0) += 1;
            }
        }

        self.num_docs = docs.len();
        self.avg_doc_length = if self.num_docs == 0 {
            0.0
        } else {
            total_length as f64 / self.num_docs as f64
        };

        self.idf_cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }

    fn idf(&self, term: &str) -> f64 {
        if let Some(cached) = self
            .idf_cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(term)
        {
            return *cached;
        }

        let doc_freq = f64::from(self.doc_freqs.get(term).copied().unwrap_or(0));
        let num_docs = self.num_docs as f64;
        let value = ((num_docs - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();

        self.idf_cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .put(term.to_string(), value);
        value
    }

    /// BM25 score of `doc_text` (identified by `doc_id`, which must have
    /// already been indexed) against `query`.
    #[must_use]
    pub fn score(&self, query: &str, doc_id: &str, doc_text: &str) -> f64 {
        let doc_length = self.doc_lengths.get(doc_id).copied().unwrap_or(0) as f64;
        let len_norm = if self.avg_doc_length > 0.0 {
            (1.0 - self.b) + self.b * doc_length / self.avg_doc_length
        } else {
            1.0
        };

        let doc_tokens = tokenize(doc_text);
        let mut term_counts: HashMap<&str, u32> = HashMap::new();
        for token in &doc_tokens {
            *term_counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let query_tokens: std::collections::HashSet<_> = tokenize(query).into_iter().collect();

        query_tokens
            .iter()
            .filter_map(|term| {
                let tf = f64::from(*term_counts.get(term.as_str())?);
                let idf = self.idf(term);
                Some(idf * tf * (self.k1 + 1.0) / (tf + self.k1 * len_norm))
            })
            .sum()
    }

    /// Re-index `documents` as a fresh batch, score each against `query`,
    /// blend with its prior score (`0.7·bm25 + 0.3·prior`), and return
    /// `(doc_id, combined_score)` stable-sorted descending.
    #[tracing::instrument(skip(self, documents), fields(doc_count = documents.len()))]
    pub fn rank(
        &mut self,
        documents: &[(String, String, f64)],
        query: &str,
    ) -> Vec<(String, f64)> {
        let docs_for_index: Vec<(String, String)> = documents
            .iter()
            .map(|(id, text, _)| (id.clone(), text.clone()))
            .collect();
        self.index_documents(&docs_for_index);

        let mut scored: Vec<(String, f64)> = documents
            .iter()
            .map(|(doc_id, text, prior)| {
                let bm25 = self.score(query, doc_id, text);
                (doc_id.clone(), 0.7 * bm25 + 0.3 * prior)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_documents_matching_more_query_terms_higher() {
        let mut ranker = Bm25Ranker::default();
        let docs = vec![
            ("a".to_string(), "fix parser bug in tokenizer".to_string()),
            ("b".to_string(), "update documentation typo".to_string()),
        ];
        ranker.index_documents(&docs);

        let score_a = ranker.score("parser bug", "a", &docs[0].1);
        let score_b = ranker.score("parser bug", "b", &docs[1].1);
        assert!(score_a > score_b);
    }

    #[test]
    fn rank_blends_bm25_and_prior_score() {
        let mut ranker = Bm25Ranker::default();
        let documents = vec![
            ("a".to_string(), "fix parser bug".to_string(), 0.2),
            ("b".to_string(), "totally unrelated text".to_string(), 0.9),
        ];
        let ranked = ranker.rank(&documents, "parser bug");
        assert_eq!(ranked.len(), 2);
        // "a" should win on BM25 relevance despite a lower prior score.
        assert_eq!(ranked[0].0, "a");
    }

    #[test]
    fn empty_document_set_scores_zero() {
        let mut ranker = Bm25Ranker::default();
        ranker.index_documents(&[]);
        assert_eq!(ranker.score("anything", "missing", "anything"), 0.0);
    }
}
