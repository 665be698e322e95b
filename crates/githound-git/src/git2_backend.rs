//! `git2`-backed implementation of [`Repository`].

use crate::error::GitError;
use crate::repository::{GitResult, Repository};
use crate::types::{
    BranchInfo, ChangeType, CommitData, DiffEntry, FileStat, IterCommitsSpec, PersonInfo,
    RemoteInfo, TagInfo,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A `git2::Repository` wrapped for shared, blocking-safe access from
/// async callers. `git2::Repository` is `!Sync`, so every operation runs
/// inside `spawn_blocking` against a `Mutex`-guarded handle.
pub struct Git2Repository {
    inner: Arc<Mutex<git2::Repository>>,
}

impl Git2Repository {
    /// Discover a repository starting from `path`, walking up parent
    /// directories as `git2::Repository::discover` does.
    ///
    /// # Errors
    /// Returns `GitError::NotARepository` if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> GitResult<Self> {
        let repo = git2::Repository::discover(path.as_ref())
            .map_err(|_| GitError::NotARepository(path.as_ref().display().to_string()))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(repo)),
        })
    }

    /// Open a repository at an exact path (no parent-directory walk).
    ///
    /// # Errors
    /// Returns `GitError::Git2` if the path is not a repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let repo = git2::Repository::open(path.as_ref())?;
        Ok(Self {
            inner: Arc::new(Mutex::new(repo)),
        })
    }

    /// Whether the working directory has any uncommitted changes.
    ///
    /// # Errors
    /// Returns `GitError::Git2` if status cannot be computed.
    pub async fn is_dirty(&self) -> GitResult<bool> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let statuses = repo.statuses(None)?;
            Ok(statuses
                .iter()
                .any(|s| s.status() != git2::Status::CURRENT))
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }
}

fn signature_to_person(sig: &git2::Signature) -> PersonInfo {
    PersonInfo {
        name: sig.name().unwrap_or_default().to_string(),
        email: sig.email().unwrap_or_default().to_string(),
    }
}

fn compute_diff_stats(diff: &git2::Diff) -> GitResult<(HashMap<String, FileStat>, usize, usize)> {
    let files: RefCell<HashMap<String, FileStat>> = RefCell::new(HashMap::new());
    let current_path: RefCell<Option<String>> = RefCell::new(None);

    diff.foreach(
        &mut |delta, _progress| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().replace('\\', "/"));
            *current_path.borrow_mut() = path;
            true
        },
        None,
        None,
        Some(&mut |_delta, _hunk, line| {
            if let Some(path) = current_path.borrow().clone() {
                let mut files = files.borrow_mut();
                let entry = files.entry(path).or_default();
                match line.origin() {
                    '+' => entry.insertions += 1,
                    '-' => entry.deletions += 1,
                    _ => {}
                }
            }
            true
        }),
    )?;

    let files = files.into_inner();
    let total_insertions = files.values().map(|f| f.insertions).sum();
    let total_deletions = files.values().map(|f| f.deletions).sum();
    Ok((files, total_insertions, total_deletions))
}

fn change_type_from_delta(status: git2::Delta) -> ChangeType {
    match status {
        git2::Delta::Added => ChangeType::Added,
        git2::Delta::Deleted => ChangeType::Deleted,
        git2::Delta::Renamed => ChangeType::Renamed,
        git2::Delta::Copied => ChangeType::Copied,
        git2::Delta::Typechange => ChangeType::TypeChanged,
        git2::Delta::Unmodified => ChangeType::Unmodified,
        _ => ChangeType::Modified,
    }
}

fn commit_to_data(repo: &git2::Repository, commit: &git2::Commit) -> GitResult<CommitData> {
    let hexsha = commit.id().to_string();
    let author = signature_to_person(&commit.author());
    let committer = signature_to_person(&commit.committer());
    let message = commit.message().unwrap_or_default().trim().to_string();
    let committed_date = commit.time().seconds();
    let committed_datetime = Utc
        .timestamp_opt(committed_date, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let parents: Vec<String> = commit.parent_ids().map(|id| id.to_string()).collect();

    let new_tree = commit.tree()?;
    let old_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let diff = repo.diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;
    let (files, total_insertions, total_deletions) = compute_diff_stats(&diff)?;

    Ok(CommitData {
        hexsha,
        author,
        committer,
        message,
        committed_date,
        committed_datetime,
        parents,
        files,
        total_insertions,
        total_deletions,
    })
}

#[async_trait]
impl Repository for Git2Repository {
    async fn active_branch_name(&self) -> GitResult<String> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let head = repo.head()?;
            Ok(if head.is_branch() {
                head.shorthand().unwrap_or("HEAD").to_string()
            } else {
                "HEAD".to_string()
            })
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn working_dir(&self) -> GitResult<PathBuf> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            repo.workdir()
                .map(Path::to_path_buf)
                .ok_or_else(|| GitError::NotARepository("bare repository has no working directory".to_string()))
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn commit(&self, hash: &str) -> GitResult<Option<CommitData>> {
        let inner = self.inner.clone();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let Ok(oid) = git2::Oid::from_str(&hash) else {
                return Ok(None);
            };
            match repo.find_commit(oid) {
                Ok(commit) => Ok(Some(commit_to_data(&repo, &commit)?)),
                Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn iter_commits(&self, spec: IterCommitsSpec) -> GitResult<Vec<CommitData>> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut walk = repo.revwalk()?;
            walk.set_sorting(git2::Sort::TIME)?;
            match &spec.reference {
                Some(reference) => walk.push_ref(reference)?,
                None => walk.push_head()?,
            }

            let mut commits = Vec::new();
            for oid in walk {
                if let Some(max) = spec.max_count {
                    if commits.len() >= max {
                        break;
                    }
                }
                let oid = oid?;
                let commit = repo.find_commit(oid)?;
                let data = commit_to_data(&repo, &commit)?;

                if let Some(since) = spec.since {
                    if data.committed_datetime < since {
                        continue;
                    }
                }
                if let Some(until) = spec.until {
                    if data.committed_datetime > until {
                        continue;
                    }
                }
                if let Some(paths) = &spec.paths {
                    let touches = data.files.keys().any(|f| paths.iter().any(|p| f.starts_with(p.as_str())));
                    if !touches {
                        continue;
                    }
                }

                commits.push(data);
            }
            Ok(commits)
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn branches(&self) -> GitResult<Vec<BranchInfo>> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut out = Vec::new();
            for branch in repo.branches(None)? {
                let (branch, _branch_type) = branch?;
                let name = branch.name()?.unwrap_or_default().to_string();
                let is_head = branch.is_head();
                out.push(BranchInfo { name, is_head });
            }
            Ok(out)
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn tags(&self) -> GitResult<Vec<TagInfo>> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut out = Vec::new();
            for name in (repo.tag_names(None)?).iter().flatten() {
                if let Ok(obj) = repo.revparse_single(&format!("refs/tags/{name}")) {
                    out.push(TagInfo {
                        name: name.to_string(),
                        target_hexsha: obj.id().to_string(),
                    });
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn remotes(&self) -> GitResult<Vec<RemoteInfo>> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut out = Vec::new();
            for name in (repo.remotes()?).iter().flatten() {
                if let Ok(remote) = repo.find_remote(name) {
                    out.push(RemoteInfo {
                        name: name.to_string(),
                        url: remote.url().map(str::to_string),
                    });
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn diff(&self, commit: &CommitData, other: Option<&CommitData>) -> GitResult<Vec<DiffEntry>> {
        let inner = self.inner.clone();
        let commit_hash = commit.hexsha.clone();
        let other_hash = other.map(|c| c.hexsha.clone());
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let new_commit = repo.find_commit(git2::Oid::from_str(&commit_hash)?)?;
            let new_tree = new_commit.tree()?;

            let old_tree = match other_hash {
                Some(hash) => Some(repo.find_commit(git2::Oid::from_str(&hash)?)?.tree()?),
                None if new_commit.parent_count() > 0 => Some(new_commit.parent(0)?.tree()?),
                None => None,
            };

            let diff = repo.diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;
            let (stats, _total_insertions, _total_deletions) = compute_diff_stats(&diff)?;

            let mut entries = Vec::new();
            for delta in diff.deltas() {
                let a_path = delta.old_file().path().map(|p| p.to_string_lossy().replace('\\', "/"));
                let b_path = delta.new_file().path().map(|p| p.to_string_lossy().replace('\\', "/"));
                let stat = b_path.as_ref().or(a_path.as_ref()).and_then(|p| stats.get(p));

                entries.push(DiffEntry {
                    a_path,
                    b_path,
                    change_type: change_type_from_delta(delta.status()),
                    insertions: stat.map(|s| s.insertions),
                    deletions: stat.map(|s| s.deletions),
                    blob_size: Some(delta.new_file().size()),
                });
            }
            Ok(entries)
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }

    async fn read_blob(&self, commit_hash: &str, path: &str) -> GitResult<Option<Vec<u8>>> {
        let inner = self.inner.clone();
        let commit_hash = commit_hash.to_string();
        let path = path.to_string();
        tokio::task::spawn_blocking(move || {
            let repo = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let commit = repo.find_commit(git2::Oid::from_str(&commit_hash)?)?;
            let tree = commit.tree()?;
            let Ok(entry) = tree.get_path(Path::new(&path)) else {
                return Ok(None);
            };
            let Ok(object) = entry.to_object(&repo) else {
                return Ok(None);
            };
            Ok(object.as_blob().map(|blob| blob.content().to_vec()))
        })
        .await
        .map_err(|e| GitError::Other(e.to_string()))?
    }
}
