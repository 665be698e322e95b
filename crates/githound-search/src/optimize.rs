//! Rewrites a raw query into one more likely to match, before planning
//! or execution (§4.7).

use crate::model::SearchQuery;

const TYPO_TABLE: &[(&str, &str)] =
    &[("comit", "commit"), ("fiel", "file"), ("funciton", "function"), ("calss", "class")];

/// Text patterns shorter than this are promoted to fuzzy automatically,
/// since an exact/regex match on so few characters is likely to miss a
/// near-identical real value.
const AUTO_FUZZY_TEXT_LEN: usize = 10;
const AUTO_FUZZY_AUTHOR_LEN: usize = 15;

#[derive(Default)]
pub struct QueryOptimizer;

impl QueryOptimizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn optimize(&self, mut query: SearchQuery) -> SearchQuery {
        if let Some(pattern) = query.content_pattern.take() {
            query.content_pattern = Some(Self::rewrite_text(&pattern));
        }
        if let Some(pattern) = query.message_pattern.take() {
            query.message_pattern = Some(Self::rewrite_text(&pattern));
        }
        if let Some(pattern) = query.file_path_pattern.take() {
            query.file_path_pattern = Some(Self::normalize_path(&pattern));
        }
        query.include_globs = query.include_globs.iter().map(|g| Self::normalize_path(g)).collect();
        query.exclude_globs = query.exclude_globs.iter().map(|g| Self::normalize_path(g)).collect();

        if !query.fuzzy_search {
            let content_short = query
                .content_pattern
                .as_deref()
                .is_some_and(|p| p.len() < AUTO_FUZZY_TEXT_LEN);
            let message_short = query
                .message_pattern
                .as_deref()
                .is_some_and(|p| p.len() < AUTO_FUZZY_TEXT_LEN);
            let author_short =
                query.author_pattern.as_deref().is_some_and(|p| p.len() < AUTO_FUZZY_AUTHOR_LEN);
            if content_short || message_short || author_short {
                query.fuzzy_search = true;
            }
        }

        query
    }

    fn rewrite_text(pattern: &str) -> String {
        let collapsed = pattern.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut lowered = collapsed.to_lowercase();
        for (typo, fix) in TYPO_TABLE {
            if lowered == *typo {
                lowered = (*fix).to_string();
                continue;
            }
            let with_spaces = format!(" {typo} ");
            let replacement = format!(" {fix} ");
            lowered = lowered.replace(&with_spaces, &replacement);
        }
        lowered
    }

    fn normalize_path(pattern: &str) -> String {
        pattern.replace('\\', "/").trim_matches('/').to_string()
    }

    /// A rough `max_results` estimate from how specific the query already
    /// is: more criteria set means a narrower, cheaper result set.
    #[must_use]
    pub fn estimate_max_results(query: &SearchQuery) -> Option<usize> {
        match query.criteria_count() {
            0 => None,
            1 => Some(1000),
            2 => Some(500),
            _ => Some(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_known_typos_as_whole_words() {
        let optimizer = QueryOptimizer::new();
        let query = SearchQuery { message_pattern: Some("comit message".into()), ..SearchQuery::new() };
        let result = optimizer.optimize(query);
        assert_eq!(result.message_pattern.as_deref(), Some("commit message"));
    }

    #[test]
    fn normalizes_backslashes_and_trims_slashes() {
        let optimizer = QueryOptimizer::new();
        let query =
            SearchQuery { file_path_pattern: Some("/src\\main.rs/".into()), ..SearchQuery::new() };
        let result = optimizer.optimize(query);
        assert_eq!(result.file_path_pattern.as_deref(), Some("src/main.rs"));
    }

    #[test]
    fn enables_fuzzy_for_short_author_pattern() {
        let optimizer = QueryOptimizer::new();
        let query = SearchQuery { author_pattern: Some("bob".into()), ..SearchQuery::new() };
        let result = optimizer.optimize(query);
        assert!(result.fuzzy_search);
    }
}
