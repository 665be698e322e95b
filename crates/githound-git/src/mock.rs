//! An in-memory [`Repository`] double for tests that don't need a real
//! on-disk checkout.

use crate::error::GitError;
use crate::repository::{GitResult, Repository};
use crate::types::{BranchInfo, CommitData, DiffEntry, IterCommitsSpec, RemoteInfo, TagInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Builds up commit/branch/tag/remote fixtures in memory and can be told
/// to fail the next call, the way the teacher's file-backed mocks do.
#[derive(Default)]
pub struct MockRepository {
    commits: Mutex<Vec<CommitData>>,
    branches: Mutex<Vec<BranchInfo>>,
    tags: Mutex<Vec<TagInfo>>,
    remotes: Mutex<Vec<RemoteInfo>>,
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
    working_dir: Mutex<PathBuf>,
    active_branch: Mutex<String>,
    should_fail_next: Arc<Mutex<bool>>,
    error_message: Arc<Mutex<String>>,
}

impl MockRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active_branch: Mutex::new("main".to_string()),
            ..Self::default()
        }
    }

    pub fn with_commit(self, commit: CommitData) -> Self {
        self.commits.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(commit);
        self
    }

    pub fn with_branch(self, branch: BranchInfo) -> Self {
        self.branches.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(branch);
        self
    }

    pub fn with_tag(self, tag: TagInfo) -> Self {
        self.tags.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(tag);
        self
    }

    pub fn with_remote(self, remote: RemoteInfo) -> Self {
        self.remotes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(remote);
        self
    }

    pub fn with_blob(self, commit_hash: &str, path: &str, content: Vec<u8>) -> Self {
        self.blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert((commit_hash.to_string(), path.to_string()), content);
        self
    }

    #[must_use]
    pub fn with_working_dir(self, dir: PathBuf) -> Self {
        *self.working_dir.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = dir;
        self
    }

    /// Makes the next single call return `Err(GitError::Other(message))`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.should_fail_next.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = true;
        *self.error_message.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = message.into();
    }

    fn take_failure(&self) -> Option<GitError> {
        let mut flag = self.should_fail_next.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if *flag {
            *flag = false;
            let message = self.error_message.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone();
            Some(GitError::Other(message))
        } else {
            None
        }
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn active_branch_name(&self) -> GitResult<String> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.active_branch.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    async fn working_dir(&self) -> GitResult<PathBuf> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.working_dir.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    async fn commit(&self, hash: &str) -> GitResult<Option<CommitData>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self
            .commits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .find(|c| c.hexsha == hash)
            .cloned())
    }

    async fn iter_commits(&self, spec: IterCommitsSpec) -> GitResult<Vec<CommitData>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        let commits = self.commits.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut out: Vec<CommitData> = commits
            .iter()
            .filter(|c| spec.since.is_none_or(|s| c.committed_datetime >= s))
            .filter(|c| spec.until.is_none_or(|u| c.committed_datetime <= u))
            .filter(|c| {
                spec.paths.as_ref().is_none_or(|paths| {
                    c.files.keys().any(|f| paths.iter().any(|p| f.starts_with(p.as_str())))
                })
            })
            .cloned()
            .collect();
        if let Some(max) = spec.max_count {
            out.truncate(max);
        }
        Ok(out)
    }

    async fn branches(&self) -> GitResult<Vec<BranchInfo>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.branches.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    async fn tags(&self) -> GitResult<Vec<TagInfo>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.tags.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    async fn remotes(&self) -> GitResult<Vec<RemoteInfo>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.remotes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    async fn diff(&self, commit: &CommitData, _other: Option<&CommitData>) -> GitResult<Vec<DiffEntry>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(commit
            .files
            .iter()
            .map(|(path, stat)| DiffEntry {
                a_path: Some(path.clone()),
                b_path: Some(path.clone()),
                change_type: crate::types::ChangeType::Modified,
                insertions: Some(stat.insertions),
                deletions: Some(stat.deletions),
                blob_size: None,
            })
            .collect())
    }

    async fn read_blob(&self, commit_hash: &str, path: &str) -> GitResult<Option<Vec<u8>>> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self
            .blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&(commit_hash.to_string(), path.to_string()))
            .cloned())
    }
}
