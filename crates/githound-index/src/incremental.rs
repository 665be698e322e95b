//! Incremental, repository-identity-keyed maintenance of the three
//! inverted indexes (content, message, author).

use crate::error::{IndexError, Result};
use crate::inverted_index::{DocMetadata, InvertedIndex};
use githound_git::{repo_hash, CommitData, IterCommitsSpec, Repository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Only the most recent this-many new commits get a content document per
/// build, bounding per-build cost on large histories.
const DEFAULT_CONTENT_WINDOW: usize = 1000;

/// Blobs larger than this are skipped for content indexing.
const MAX_BLOB_BYTES: u64 = 1024 * 1024;

/// Which of the three indexes a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Content,
    Messages,
    Authors,
}

impl IndexKind {
    fn file_suffix(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Messages => "messages",
            Self::Authors => "authors",
        }
    }
}

/// Outcome of [`IncrementalIndexer::build_incremental_index`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    pub status: BuildStatus,
    pub new_commits_indexed: usize,
    pub total_indexed_commits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildStatus {
    UpToDate,
    Updated,
}

/// A progress callback: `(message, fraction_complete)`.
pub type ProgressFn<'a> = dyn Fn(&str, f64) + Send + Sync + 'a;

/// Owns the three inverted indexes for one repository and tracks which
/// commits have already been indexed, so repeated builds only process
/// new history.
pub struct IncrementalIndexer {
    cache_dir: PathBuf,
    repo_path: String,
    content_index: InvertedIndex,
    message_index: InvertedIndex,
    author_index: InvertedIndex,
    indexed_commits: HashSet<String>,
    last_index_time: Option<chrono::DateTime<chrono::Utc>>,
    content_window: usize,
}

impl IncrementalIndexer {
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>, repo_path: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_path: repo_path.into(),
            content_index: InvertedIndex::new(),
            message_index: InvertedIndex::new(),
            author_index: InvertedIndex::new(),
            indexed_commits: HashSet::new(),
            last_index_time: None,
            content_window: DEFAULT_CONTENT_WINDOW,
        }
    }

    /// Override the content-indexing window (default 1000 commits).
    #[must_use]
    pub fn with_content_window(mut self, window: usize) -> Self {
        self.content_window = window;
        self
    }

    #[must_use]
    pub fn indexed_commit_count(&self) -> usize {
        self.indexed_commits.len()
    }

    #[must_use]
    pub fn get_index_path(&self, kind: IndexKind) -> PathBuf {
        let hash = repo_hash(&self.repo_path);
        self.cache_dir.join(format!("{hash}_{}.idx", kind.file_suffix()))
    }

    fn commits_path(&self) -> PathBuf {
        let hash = repo_hash(&self.repo_path);
        self.cache_dir.join(format!("{hash}_commits.json"))
    }

    /// Attempt to load all three indexes plus the indexed-commits
    /// metadata file. Returns `true` only if every one of them loads
    /// successfully; a partial load is discarded so the in-memory state
    /// never mixes old and missing indexes.
    pub fn load_indexes(&mut self) -> bool {
        let Some(content) = InvertedIndex::load(&self.get_index_path(IndexKind::Content)) else {
            return false;
        };
        let Some(messages) = InvertedIndex::load(&self.get_index_path(IndexKind::Messages)) else {
            return false;
        };
        let Some(authors) = InvertedIndex::load(&self.get_index_path(IndexKind::Authors)) else {
            return false;
        };
        let Ok(commits_bytes) = std::fs::read(self.commits_path()) else {
            return false;
        };
        let Ok(indexed_commits) = serde_json::from_slice::<HashSet<String>>(&commits_bytes) else {
            return false;
        };

        self.content_index = content;
        self.message_index = messages;
        self.author_index = authors;
        self.indexed_commits = indexed_commits;
        true
    }

    fn persist(&self) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| IndexError::Io(e.to_string()))?;
        self.content_index.save(&self.get_index_path(IndexKind::Content))?;
        self.message_index.save(&self.get_index_path(IndexKind::Messages))?;
        self.author_index.save(&self.get_index_path(IndexKind::Authors))?;
        let bytes = serde_json::to_vec(&self.indexed_commits)?;
        std::fs::write(self.commits_path(), bytes).map_err(|e| IndexError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load existing indexes, enumerate up to `max_commits` on `branch`
    /// (or `HEAD` when `None`), index every new commit's message/author
    /// unconditionally and its content only within the most recent
    /// `content_window` new commits, persist, and report progress every
    /// 100 commits via `progress`.
    ///
    /// # Errors
    /// Returns an error if the repository can't be walked or the
    /// resulting indexes can't be persisted.
    #[tracing::instrument(skip(self, repo, progress))]
    pub async fn build_incremental_index(
        &mut self,
        repo: &Arc<dyn Repository>,
        branch: Option<&str>,
        progress: Option<&ProgressFn<'_>>,
        max_commits: usize,
    ) -> Result<BuildStats> {
        self.load_indexes();

        let spec = IterCommitsSpec {
            reference: branch.map(|b| format!("refs/heads/{b}")),
            max_count: Some(max_commits),
            ..IterCommitsSpec::default()
        };
        let commits = repo.iter_commits(spec).await?;

        let new_commits: Vec<&CommitData> =
            commits.iter().filter(|c| !self.indexed_commits.contains(&c.hexsha)).collect();

        if new_commits.is_empty() {
            return Ok(BuildStats {
                status: BuildStatus::UpToDate,
                new_commits_indexed: 0,
                total_indexed_commits: self.indexed_commits.len(),
            });
        }

        let total = new_commits.len();
        let content_cutoff = total.saturating_sub(self.content_window);

        for (i, commit) in new_commits.iter().enumerate() {
            let author_text = format!("{} {}", commit.author.name, commit.author.email);
            self.author_index.add_document(
                &commit.hexsha,
                &author_text,
                DocMetadata { fields: [("hexsha".to_string(), commit.hexsha.clone())].into() },
            );
            self.message_index.add_document(
                &commit.hexsha,
                &commit.message,
                DocMetadata { fields: [("hexsha".to_string(), commit.hexsha.clone())].into() },
            );

            if i >= content_cutoff {
                self.index_commit_content(repo, commit).await?;
            }

            self.indexed_commits.insert(commit.hexsha.clone());

            if (i + 1) % 100 == 0 {
                if let Some(progress) = progress {
                    #[allow(clippy::cast_precision_loss)]
                    let fraction = (i + 1) as f64 / total as f64;
                    progress(&format!("Indexed {}/{total} commits", i + 1), fraction);
                }
            }
        }

        self.content_index.update_stats();
        self.message_index.update_stats();
        self.author_index.update_stats();
        self.last_index_time = Some(chrono::Utc::now());
        self.persist()?;

        if let Some(progress) = progress {
            progress(&format!("Indexed {total}/{total} commits"), 1.0);
        }

        Ok(BuildStats {
            status: BuildStatus::Updated,
            new_commits_indexed: total,
            total_indexed_commits: self.indexed_commits.len(),
        })
    }

    async fn index_commit_content(&mut self, repo: &Arc<dyn Repository>, commit: &CommitData) -> Result<()> {
        for path in commit.files.keys() {
            let Some(bytes) = repo.read_blob(&commit.hexsha, path).await? else {
                continue;
            };
            #[allow(clippy::cast_lossless)]
            if bytes.len() as u64 > MAX_BLOB_BYTES {
                continue;
            }
            let text = String::from_utf8_lossy(&bytes);
            let doc_id = format!("{}:{path}", commit.hexsha);
            self.content_index.add_document(
                &doc_id,
                &text,
                DocMetadata {
                    fields: [
                        ("hexsha".to_string(), commit.hexsha.clone()),
                        ("path".to_string(), path.clone()),
                    ]
                    .into(),
                },
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn search_content(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        self.content_index.search(query, limit)
    }

    #[must_use]
    pub fn search_messages(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        self.message_index.search(query, limit)
    }

    #[must_use]
    pub fn search_authors(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        self.author_index.search(query, limit)
    }
}

#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("githound")
        .join("index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use githound_git::MockRepository;

    fn repo_with_commits() -> Arc<dyn Repository> {
        use chrono::Utc;
        use githound_git::{FileStat, PersonInfo};

        let mut files = std::collections::HashMap::new();
        files.insert("src/lib.rs".to_string(), FileStat { insertions: 3, deletions: 0 });

        let commit = CommitData {
            hexsha: "a".repeat(40),
            author: PersonInfo { name: "Alice".into(), email: "alice@example.com".into() },
            committer: PersonInfo { name: "Alice".into(), email: "alice@example.com".into() },
            message: "fix authentication bug".into(),
            committed_date: 0,
            committed_datetime: Utc::now(),
            parents: vec![],
            files,
            total_insertions: 3,
            total_deletions: 0,
        };

        Arc::new(MockRepository::new().with_commit(commit))
    }

    #[tokio::test]
    async fn first_build_indexes_all_commits() {
        let repo = repo_with_commits();
        let dir = tempfile::tempdir().expect("tempdir");
        let mut indexer = IncrementalIndexer::new(dir.path(), "/fake/repo");

        let stats = indexer.build_incremental_index(&repo, None, None, 10_000).await.expect("build");
        assert_eq!(stats.status, BuildStatus::Updated);
        assert_eq!(stats.new_commits_indexed, 1);
        assert_eq!(indexer.indexed_commit_count(), 1);

        let hits = indexer.search_messages("authentication", 10);
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn second_build_is_up_to_date() {
        let repo = repo_with_commits();
        let dir = tempfile::tempdir().expect("tempdir");
        let mut indexer = IncrementalIndexer::new(dir.path(), "/fake/repo");
        indexer.build_incremental_index(&repo, None, None, 10_000).await.expect("first build");

        let stats = indexer.build_incremental_index(&repo, None, None, 10_000).await.expect("second build");
        assert_eq!(stats.status, BuildStatus::UpToDate);
        assert_eq!(stats.new_commits_indexed, 0);
    }

    #[tokio::test]
    async fn reloading_indexer_restores_state() {
        let repo = repo_with_commits();
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut indexer = IncrementalIndexer::new(dir.path(), "/fake/repo");
            indexer.build_incremental_index(&repo, None, None, 10_000).await.expect("build");
        }

        let mut reloaded = IncrementalIndexer::new(dir.path(), "/fake/repo");
        assert!(reloaded.load_indexes());
        assert_eq!(reloaded.indexed_commit_count(), 1);
    }
}
