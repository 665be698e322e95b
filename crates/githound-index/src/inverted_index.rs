//! Term -> postings inverted index with TF-IDF scoring, used as the
//! fast-path lookup structure behind the incremental indexer.

use githound_rank::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single occurrence of a term within a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub position: usize,
}

/// Per-document metadata carried alongside the postings, so callers can
/// hydrate a search hit without going back to the repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocMetadata {
    pub fields: HashMap<String, String>,
}

/// Running totals recomputed by [`InvertedIndex::update_stats`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_terms: usize,
    pub total_postings: usize,
    pub avg_postings_per_term: f64,
}

/// A term -> document -> postings inverted index over one logical field
/// (content, commit message, or author identity).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    index: HashMap<String, HashMap<String, Vec<Posting>>>,
    doc_freq: HashMap<String, usize>,
    doc_lengths: HashMap<String, usize>,
    doc_metadata: HashMap<String, DocMetadata>,
    total_docs: usize,
    stats: IndexStats,
}

impl InvertedIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_docs(&self) -> usize {
        self.total_docs
    }

    #[must_use]
    pub fn contains_doc(&self, doc_id: &str) -> bool {
        self.doc_lengths.contains_key(doc_id)
    }

    #[must_use]
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Tokenise `text`, append postings for `doc_id`, and bump `doc_freq`
    /// once per unique term the document introduces. Adding the same
    /// `doc_id` twice duplicates its postings; callers (the incremental
    /// indexer) are responsible for not re-adding an already-indexed doc.
    pub fn add_document(&mut self, doc_id: &str, text: &str, metadata: DocMetadata) {
        let tokens = tokenize(text);
        self.doc_lengths.insert(doc_id.to_string(), tokens.len());
        self.doc_metadata.insert(doc_id.to_string(), metadata);

        let mut seen_terms = std::collections::HashSet::new();
        for (position, term) in tokens.iter().enumerate() {
            self.index
                .entry(term.clone())
                .or_default()
                .entry(doc_id.to_string())
                .or_default()
                .push(Posting { position });

            if seen_terms.insert(term.clone()) {
                *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        self.total_docs += 1;
    }

    /// Tokenise `query_text` and score every candidate document as
    /// `Σ_t tf(t,d) · idf(t)`, returning the top `limit` by score.
    #[must_use]
    pub fn search(&self, query_text: &str, limit: usize) -> Vec<(String, f64)> {
        let query_tokens = tokenize(query_text);
        let mut scores: HashMap<&str, f64> = HashMap::new();

        for term in &query_tokens {
            let Some(postings_by_doc) = self.index.get(term) else {
                continue;
            };
            let doc_freq = self.doc_freq.get(term).copied().unwrap_or(0);
            #[allow(clippy::cast_precision_loss)]
            let idf = (((self.total_docs + 1) as f64) / ((doc_freq + 1) as f64)).ln();

            for (doc_id, postings) in postings_by_doc {
                #[allow(clippy::cast_precision_loss)]
                let tf = postings.len() as f64;
                *scores.entry(doc_id.as_str()).or_insert(0.0) += tf * idf;
            }
        }

        let mut ranked: Vec<(String, f64)> =
            scores.into_iter().map(|(doc_id, score)| (doc_id.to_string(), score)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }

    /// Recompute `total_terms`, `total_postings`, and
    /// `avg_postings_per_term` from the current index contents.
    pub fn update_stats(&mut self) {
        let total_terms = self.index.len();
        let total_postings: usize = self.index.values().map(|d| d.values().map(Vec::len).sum::<usize>()).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_postings_per_term = if total_terms == 0 {
            0.0
        } else {
            total_postings as f64 / total_terms as f64
        };
        self.stats = IndexStats {
            total_terms,
            total_postings,
            avg_postings_per_term,
        };
    }

    /// Serialize the whole struct to `path` via a temp-file-then-rename,
    /// so a crash mid-write never leaves a half-written index on disk.
    ///
    /// # Errors
    /// Returns an error if serialization or the filesystem write fails.
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let bytes = serde_json::to_vec(self)?;
        let tmp_path = path.with_extension("idx.tmp");
        std::fs::write(&tmp_path, bytes).map_err(|e| crate::error::IndexError::Io(e.to_string()))?;
        std::fs::rename(&tmp_path, path).map_err(|e| crate::error::IndexError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a previously saved index from `path`. A missing or corrupt
    /// file is reported as `Ok(None)`, never as an error - callers treat
    /// it as "not loaded" and rebuild from scratch.
    #[must_use]
    pub fn load(path: &std::path::Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_rarer_terms_higher() {
        let mut idx = InvertedIndex::new();
        idx.add_document("d1", "fix authentication bug in login handler", DocMetadata::default());
        idx.add_document("d2", "fix typo in readme", DocMetadata::default());
        idx.add_document("d3", "fix authentication timeout retry logic", DocMetadata::default());

        let results = idx.search("authentication", 10);
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|(id, _)| id == "d1"));
        assert!(results.iter().any(|(id, _)| id == "d3"));
    }

    #[test]
    fn save_and_load_round_trips() {
        let mut idx = InvertedIndex::new();
        idx.add_document("d1", "refactor parser module", DocMetadata::default());
        idx.update_stats();

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("content.idx");
        idx.save(&path).expect("save");

        let loaded = InvertedIndex::load(&path).expect("load");
        assert_eq!(loaded.total_docs(), 1);
        assert_eq!(loaded.stats().total_terms, idx.stats().total_terms);
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.idx");
        assert!(InvertedIndex::load(&path).is_none());
    }

    #[test]
    fn load_corrupt_file_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corrupt.idx");
        std::fs::write(&path, b"not json").expect("write");
        assert!(InvertedIndex::load(&path).is_none());
    }
}
