//! The repository collaborator contract.

use crate::error::GitError;
use crate::types::{BranchInfo, CommitData, DiffEntry, IterCommitsSpec, RemoteInfo, TagInfo};
use async_trait::async_trait;
use std::path::PathBuf;

pub type GitResult<T> = std::result::Result<T, GitError>;

/// What searchers and the indexer need from a Git repository. Names and
/// shapes follow the engine's external-interfaces contract; the `git2`
/// backend and the in-memory mock both implement this.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn active_branch_name(&self) -> GitResult<String>;

    async fn working_dir(&self) -> GitResult<PathBuf>;

    /// `Ok(None)` for an unknown hash, never an error for that case.
    async fn commit(&self, hash: &str) -> GitResult<Option<CommitData>>;

    async fn iter_commits(&self, spec: IterCommitsSpec) -> GitResult<Vec<CommitData>>;

    async fn branches(&self) -> GitResult<Vec<BranchInfo>>;

    async fn tags(&self) -> GitResult<Vec<TagInfo>>;

    async fn remotes(&self) -> GitResult<Vec<RemoteInfo>>;

    /// Diff between `commit` and `other` (or `commit`'s first parent when
    /// `other` is `None`).
    async fn diff(&self, commit: &CommitData, other: Option<&CommitData>) -> GitResult<Vec<DiffEntry>>;

    /// `Ok(None)` when the path doesn't exist at that commit, or the blob
    /// is not valid UTF-8 after lossy decoding is still desired by the
    /// caller (callers decide; this returns raw bytes).
    async fn read_blob(&self, commit_hash: &str, path: &str) -> GitResult<Option<Vec<u8>>>;
}
