//! Multi-factor relevance scoring.
//!
//! Kept deliberately data-only: callers (the orchestrator/searchers) map
//! their own result/query types into [`RelevanceInput`] so this crate
//! never depends on the search-engine domain types.

use strsim::normalized_levenshtein;

/// The seven weighted factors, normalised to sum to 1.0 by the caller
/// (mirrors `githound_config::RankingWeights`, kept separate so this
/// crate has no dependency on the config layer).
#[derive(Debug, Clone, Copy)]
pub struct RelevanceWeights {
    pub query_match: f64,
    pub recency: f64,
    pub file_importance: f64,
    pub author_relevance: f64,
    pub commit_quality: f64,
    pub context_relevance: f64,
    pub frequency: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            query_match: 0.30,
            recency: 0.20,
            file_importance: 0.15,
            author_relevance: 0.10,
            commit_quality: 0.10,
            context_relevance: 0.10,
            frequency: 0.05,
        }
    }
}

/// Everything the relevance engine needs about one result, its query,
/// and its cohort - flattened to primitives.
pub struct RelevanceInput<'a> {
    pub query_content_pattern: Option<&'a str>,
    pub query_author_pattern: Option<&'a str>,
    pub query_message_pattern: Option<&'a str>,
    pub fuzzy: bool,

    pub matching_line: Option<&'a str>,
    pub author_name: &'a str,
    pub author_email: &'a str,
    pub message: &'a str,
    pub file_path: Option<&'a str>,
    pub days_ago: i64,
    pub files_changed: usize,

    pub content_pattern_in_context: bool,
    pub message_pattern_in_context: bool,
    pub analysis_type: Option<&'a str>,

    pub same_file_count: usize,
    pub same_type_count: usize,
    pub total_results: usize,
}

const GOOD_KEYWORDS: &[&str] = &[
    "fix",
    "add",
    "update",
    "improve",
    "refactor",
    "implement",
    "feature",
    "bug",
    "issue",
    "enhancement",
];
const POOR_KEYWORDS: &[&str] = &["wip", "temp", "test", "debug", "tmp", "quick", "minor"];

const IMPORTANT_FILENAMES: &[(&str, f64)] = &[
    ("readme", 0.9),
    ("changelog", 0.8),
    ("license", 0.7),
    ("cargo.toml", 0.8),
    ("package.json", 0.8),
    ("pyproject.toml", 0.8),
    ("go.mod", 0.8),
];

const BOOST_ANCESTORS: &[&str] = &["src", "lib", "core", "main", "app"];
const PENALTY_ANCESTORS: &[&str] = &["test", "tests", "spec", "docs", "examples", "tmp", "temp"];

/// Best-effort "partial ratio" fuzzy similarity in `[0, 1]`: the best
/// normalised-Levenshtein similarity between `pattern` and any
/// same-length window of `text`. Exposed for searchers that need fuzzy
/// matching directly, outside the weighted relevance score.
#[must_use]
pub fn partial_ratio(pattern: &str, text: &str) -> f64 {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    if pattern.is_empty() || text.is_empty() {
        return 0.0;
    }

    let p_chars: Vec<char> = pattern.chars().collect();
    let t_chars: Vec<char> = text.chars().collect();

    if t_chars.len() <= p_chars.len() {
        return normalized_levenshtein(&pattern, &text);
    }

    t_chars
        .windows(p_chars.len())
        .map(|w| normalized_levenshtein(&pattern, &w.iter().collect::<String>()))
        .fold(0.0_f64, f64::max)
}

fn axis_score(pattern: &str, haystack: &str, fuzzy: bool, fuzzy_threshold: f64) -> f64 {
    if haystack.to_lowercase().contains(&pattern.to_lowercase()) {
        return 1.0;
    }
    if fuzzy {
        let score = partial_ratio(pattern, haystack);
        if score >= fuzzy_threshold {
            return score;
        }
        return score.clamp(0.0, 0.5);
    }
    0.4
}

fn query_match(input: &RelevanceInput) -> f64 {
    let mut scores = Vec::new();

    if let Some(pattern) = input.query_content_pattern {
        let haystack = input.matching_line.unwrap_or_default();
        scores.push(axis_score(pattern, haystack, input.fuzzy, 0.8));
    }
    if let Some(pattern) = input.query_author_pattern {
        let haystack = format!("{} {}", input.author_name, input.author_email);
        scores.push(axis_score(pattern, &haystack, input.fuzzy, 0.8));
    }
    if let Some(pattern) = input.query_message_pattern {
        scores.push(axis_score(pattern, input.message, input.fuzzy, 0.8));
    }

    if scores.is_empty() {
        0.5
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

fn recency(days_ago: i64) -> f64 {
    match days_ago {
        d if d <= 7 => 1.0,
        d if d <= 30 => 0.9,
        d if d <= 90 => 0.7,
        d if d <= 365 => 0.5,
        d if d <= 730 => 0.3,
        _ => 0.1,
    }
}

fn file_importance(file_path: Option<&str>) -> f64 {
    let Some(path) = file_path else {
        return 0.5;
    };

    let lower = path.to_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);
    let stem = file_name.split('.').next().unwrap_or(file_name);

    for (name, value) in IMPORTANT_FILENAMES {
        if file_name == *name || stem == *name {
            return *value;
        }
    }

    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext);
    let mut score: f64 = match extension {
        Some("py" | "js" | "java" | "cpp" | "c" | "cs") => 0.9,
        Some("ts" | "go" | "rs" | "php" | "rb") => 0.8,
        Some("md" | "rst") => 0.7,
        Some("json" | "yaml" | "yml" | "toml" | "ini" | "cfg" | "csv") => 0.6,
        Some("html" | "css" | "svg" | "png" | "jpg" | "jpeg" | "gif") => 0.5,
        _ => 0.5,
    };

    let ancestors: Vec<&str> = lower.split('/').collect();
    for ancestor in &ancestors {
        if BOOST_ANCESTORS.contains(ancestor) {
            score += 0.1;
        }
        if PENALTY_ANCESTORS.contains(ancestor) {
            score -= 0.1;
        }
    }

    score.clamp(0.1, 1.0)
}

fn author_relevance(input: &RelevanceInput) -> f64 {
    let Some(pattern) = input.query_author_pattern else {
        return 0.5;
    };
    let haystack = format!("{} {}", input.author_name, input.author_email).to_lowercase();
    if haystack.contains(&pattern.to_lowercase()) {
        1.0
    } else {
        0.3
    }
}

fn commit_quality(message: &str, files_changed: usize) -> f64 {
    let lower = message.to_lowercase();
    let mut score: f64 = 0.5;

    for keyword in GOOD_KEYWORDS {
        if lower.contains(keyword) {
            score += 0.1;
        }
    }
    for keyword in POOR_KEYWORDS {
        if lower.contains(keyword) {
            score -= 0.1;
        }
    }

    let len = message.len();
    if (20..=100).contains(&len) {
        score += 0.1;
    } else if len < 10 {
        score -= 0.2;
    }

    if (1..=10).contains(&files_changed) {
        score += 0.1;
    } else if files_changed > 50 {
        score -= 0.1;
    }

    score.clamp(0.1, 1.0)
}

fn context_relevance(input: &RelevanceInput) -> f64 {
    let mut score = 0.5;
    if input.content_pattern_in_context {
        score += 0.2;
    }
    if input.message_pattern_in_context {
        score += 0.2;
    }
    if matches!(
        input.analysis_type,
        Some("code_pattern" | "security" | "performance")
    ) {
        score += 0.3;
    }
    score
}

fn frequency(same_file_count: usize, same_type_count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.5;
    }
    let total = total as f64;
    let file_rarity = 1.0 - (same_file_count as f64 / total);
    let type_rarity = 1.0 - (same_type_count as f64 / total);
    ((file_rarity + type_rarity) / 2.0).clamp(0.1, 1.0)
}

/// The multi-factor relevance engine. Stateless beyond its weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceEngine {
    pub weights: RelevanceWeights,
}

impl RelevanceEngine {
    #[must_use]
    pub fn new(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn score(&self, input: &RelevanceInput) -> f64 {
        let w = &self.weights;
        let total = w.query_match * query_match(input)
            + w.recency * recency(input.days_ago)
            + w.file_importance * file_importance(input.file_path)
            + w.author_relevance * author_relevance(input)
            + w.commit_quality * commit_quality(input.message, input.files_changed)
            + w.context_relevance * context_relevance(input)
            + w.frequency * frequency(input.same_file_count, input.same_type_count, input.total_results);

        total.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> RelevanceInput<'static> {
        RelevanceInput {
            query_content_pattern: None,
            query_author_pattern: None,
            query_message_pattern: None,
            fuzzy: false,
            matching_line: None,
            author_name: "Alice",
            author_email: "alice@example.com",
            message: "fix parser bug",
            file_path: Some("src/main.rs"),
            days_ago: 1,
            files_changed: 3,
            content_pattern_in_context: false,
            message_pattern_in_context: false,
            analysis_type: None,
            same_file_count: 0,
            same_type_count: 0,
            total_results: 10,
        }
    }

    #[test]
    fn recent_commit_in_src_scores_higher_than_old_one_in_tests() {
        let engine = RelevanceEngine::default();
        let recent = base_input();
        let mut old = base_input();
        old.days_ago = 1000;
        old.file_path = Some("tests/fixture.rs");

        assert!(engine.score(&recent) > engine.score(&old));
    }

    #[test]
    fn exact_substring_author_match_scores_full_marks() {
        let engine = RelevanceEngine::default();
        let mut input = base_input();
        input.query_author_pattern = Some("alice");
        assert_eq!(author_relevance(&input), 1.0);
    }

    #[test]
    fn important_filename_overrides_extension_table() {
        assert_eq!(file_importance(Some("README.md")), 0.9);
    }

    #[test]
    fn score_stays_within_unit_range() {
        let engine = RelevanceEngine::default();
        let mut input = base_input();
        input.query_content_pattern = Some("parser");
        input.matching_line = Some("parser bug fixed here");
        let score = engine.score(&input);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn poor_keywords_reduce_commit_quality() {
        assert!(commit_quality("wip temp debug", 3) < commit_quality("fix add improve bug", 3));
    }
}
