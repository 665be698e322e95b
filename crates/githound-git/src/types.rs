//! Owned, git2-independent value types for the repository collaborator
//! interface. Searchers work with these rather than borrowing `git2`
//! objects directly, sidestepping `git2`'s repository-tied lifetimes.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FileStat {
    pub insertions: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone)]
pub struct PersonInfo {
    pub name: String,
    pub email: String,
}

/// A denormalised snapshot of one commit.
#[derive(Debug, Clone)]
pub struct CommitData {
    pub hexsha: String,
    pub author: PersonInfo,
    pub committer: PersonInfo,
    pub message: String,
    pub committed_date: i64,
    pub committed_datetime: DateTime<Utc>,
    pub parents: Vec<String>,
    pub files: HashMap<String, FileStat>,
    pub total_insertions: usize,
    pub total_deletions: usize,
}

impl CommitData {
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.hexsha[..self.hexsha.len().min(8)]
    }

    #[must_use]
    pub fn files_changed(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChanged,
    Unmodified,
}

/// One file-level diff entry between two commits (or a commit and its parent).
#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub a_path: Option<String>,
    pub b_path: Option<String>,
    pub change_type: ChangeType,
    pub insertions: Option<usize>,
    pub deletions: Option<usize>,
    pub blob_size: Option<u64>,
}

impl DiffEntry {
    /// The path this entry is "about" - the new path if present, else the old one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.b_path.as_deref().or(self.a_path.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct BranchInfo {
    pub name: String,
    pub is_head: bool,
}

#[derive(Debug, Clone)]
pub struct TagInfo {
    pub name: String,
    pub target_hexsha: String,
}

#[derive(Debug, Clone)]
pub struct RemoteInfo {
    pub name: String,
    pub url: Option<String>,
}

/// Parameters for `Repository::iter_commits`.
#[derive(Debug, Clone, Default)]
pub struct IterCommitsSpec {
    pub reference: Option<String>,
    pub max_count: Option<usize>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub paths: Option<Vec<String>>,
}
