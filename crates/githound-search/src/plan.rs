//! Assigns activated searchers a selectivity-based priority for progress
//! ordering; actual execution stays parallel (§4.7).

const SELECTIVITY: &[(&str, u8)] = &[
    ("commit_hash", 1),
    ("date_range", 2),
    ("file_path", 3),
    ("author", 4),
    ("message", 5),
    ("content", 6),
];

#[derive(Default)]
pub struct Planner;

impl Planner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Priority for a searcher name; unranked names (e.g. `fuzzy`,
    /// `advanced`, `file_type`) sort after the ranked set but keep a
    /// stable relative order among themselves.
    #[must_use]
    pub fn priority(&self, searcher_name: &str) -> u8 {
        SELECTIVITY
            .iter()
            .find(|(name, _)| *name == searcher_name)
            .map_or(u8::MAX, |(_, priority)| *priority)
    }

    /// Order `names` by ascending selectivity priority, stable on ties.
    #[must_use]
    pub fn order<'a>(&self, mut names: Vec<&'a str>) -> Vec<&'a str> {
        names.sort_by_key(|name| self.priority(name));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_selectivity() {
        let planner = Planner::new();
        let ordered = planner.order(vec!["content", "commit_hash", "author", "fuzzy"]);
        assert_eq!(ordered, vec!["commit_hash", "author", "content", "fuzzy"]);
    }
}
