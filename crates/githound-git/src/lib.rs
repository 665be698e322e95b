//! Git repository access: the collaborator contract (`Repository`), a
//! `git2`-backed implementation, owned value types shared across
//! searchers and the indexer, and identity helpers for keying on-disk
//! index state to a repository.

mod error;
mod git2_backend;
mod identity;
mod mock;
mod repository;
mod types;

pub use error::GitError;
pub use git2_backend::Git2Repository;
pub use identity::{normalize_git_url, repo_hash};
pub use mock::MockRepository;
pub use repository::{GitResult, Repository};
pub use types::{
    BranchInfo, ChangeType, CommitData, DiffEntry, FileStat, IterCommitsSpec, PersonInfo,
    RemoteInfo, TagInfo,
};
