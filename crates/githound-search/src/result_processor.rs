//! Post-filter / enrich / group / paginate pipeline applied to a merged
//! result set after the orchestrator's relevance sort.

use crate::model::SearchResult;
use std::collections::HashMap;

#[derive(Default)]
pub struct ResultProcessor {
    group_by_commit: bool,
}

impl ResultProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt into collapsing to one `SearchResult` per commit, keeping the
    /// highest-scoring match. Off by default - the orchestrator's own
    /// output stays one result per match.
    #[must_use]
    pub fn group_by_commit(mut self, enabled: bool) -> Self {
        self.group_by_commit = enabled;
        self
    }

    /// Drop results whose commit size falls outside
    /// `min_commit_size`/`max_commit_size`, when that information is
    /// available on the result's `commit_info`.
    #[must_use]
    pub fn post_filter(
        &self,
        results: Vec<SearchResult>,
        min_commit_size: Option<usize>,
        max_commit_size: Option<usize>,
    ) -> Vec<SearchResult> {
        results
            .into_iter()
            .filter(|r| {
                let Some(info) = &r.commit_info else {
                    return true;
                };
                let size = info.files_changed;
                min_commit_size.is_none_or(|min| size >= min) && max_commit_size.is_none_or(|max| size <= max)
            })
            .collect()
    }

    /// Attach `match_context` keys the relevance engine's
    /// `context_relevance` factor consumes, when not already set by the
    /// producing searcher.
    #[must_use]
    pub fn enrich(&self, mut results: Vec<SearchResult>) -> Vec<SearchResult> {
        for result in &mut results {
            let context = result.match_context.get_or_insert_with(HashMap::new);
            context.entry("search_type".to_string()).or_insert_with(|| format!("{:?}", result.search_type));
            if let Some(path) = &result.file_path {
                context.entry("file_path".to_string()).or_insert_with(|| path.clone());
            }
        }
        results
    }

    /// Apply grouping (if enabled) and `offset`/`limit` pagination over
    /// the already-ranked, deduplicated sequence.
    #[must_use]
    pub fn finalize(&self, results: Vec<SearchResult>, offset: usize, limit: Option<usize>) -> Vec<SearchResult> {
        let results = if self.group_by_commit { Self::collapse_by_commit(results) } else { results };
        let page: Vec<SearchResult> = results.into_iter().skip(offset).collect();
        match limit {
            Some(limit) => page.into_iter().take(limit).collect(),
            None => page,
        }
    }

    fn collapse_by_commit(results: Vec<SearchResult>) -> Vec<SearchResult> {
        let mut best: HashMap<String, SearchResult> = HashMap::new();
        let mut order = Vec::new();
        for result in results {
            match best.get(&result.commit_hash) {
                Some(existing) if existing.relevance_score >= result.relevance_score => {}
                Some(_) => {
                    best.insert(result.commit_hash.clone(), result);
                }
                None => {
                    order.push(result.commit_hash.clone());
                    best.insert(result.commit_hash.clone(), result);
                }
            }
        }
        order.into_iter().filter_map(|hash| best.remove(&hash)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SearchType;

    fn result(hash: &str, score: f64) -> SearchResult {
        SearchResult::new(hash, SearchType::Content, score)
    }

    #[test]
    fn paginate_applies_offset_and_limit() {
        let processor = ResultProcessor::new();
        let results = vec![result("a", 0.9), result("b", 0.8), result("c", 0.7)];
        let page = processor.finalize(results, 1, Some(1));
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].commit_hash, "b");
    }

    #[test]
    fn group_by_commit_keeps_the_best_match() {
        let processor = ResultProcessor::new().group_by_commit(true);
        let results = vec![result("a", 0.4), result("a", 0.9), result("b", 0.5)];
        let grouped = processor.finalize(results, 0, None);
        assert_eq!(grouped.len(), 2);
        let a = grouped.iter().find(|r| r.commit_hash == "a").unwrap();
        assert!((a.relevance_score - 0.9).abs() < f64::EPSILON);
    }
}
