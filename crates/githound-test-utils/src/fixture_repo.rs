//! A throwaway on-disk Git repository for search/index tests.

use chrono::{DateTime, Utc};
use std::path::Path;
use tempfile::TempDir;

/// Wraps a `git2::Repository::init`-created repo in a temp directory,
/// with helpers to write files and commit them without hand-rolling the
/// `git2` index/tree/commit dance in every test.
pub struct FixtureRepo {
    dir: TempDir,
    repo: git2::Repository,
}

impl FixtureRepo {
    /// Initialise a new, empty repository in a fresh temp directory.
    ///
    /// # Panics
    /// Panics if the temp directory or repository cannot be created —
    /// acceptable for test infrastructure.
    #[must_use]
    pub fn init() -> Self {
        let dir = TempDir::new().expect("create temp dir for fixture repo");
        let repo = git2::Repository::init(dir.path()).expect("init fixture repo");
        let mut config = repo.config().expect("open repo config");
        config.set_str("user.name", "Fixture Author").expect("set user.name");
        config.set_str("user.email", "fixture@example.com").expect("set user.email");
        Self { dir, repo }
    }

    /// The repository's working directory on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative_path` under the working directory,
    /// creating parent directories as needed.
    ///
    /// # Panics
    /// Panics on any filesystem error — acceptable for test infrastructure.
    pub fn write_file(&self, relative_path: &str, contents: &str) {
        let full = self.dir.path().join(relative_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(full, contents).expect("write fixture file");
    }

    /// Stage everything in the working directory and commit it with the
    /// given message, author/committer name+email, and commit time.
    /// Returns the new commit's hex SHA.
    ///
    /// # Panics
    /// Panics on any `git2` error — acceptable for test infrastructure.
    pub fn commit_all(
        &self,
        message: &str,
        author_name: &str,
        author_email: &str,
        when: DateTime<Utc>,
    ) -> String {
        let mut index = self.repo.index().expect("open repo index");
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .expect("stage files");
        index.write().expect("write index");
        let tree_oid = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_oid).expect("find tree");

        let time = git2::Time::new(when.timestamp(), 0);
        let signature = git2::Signature::new(author_name, author_email, &time)
            .expect("build signature");

        let parent_commit = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("create commit");
        oid.to_string()
    }

    /// Create a lightweight tag pointing at the current `HEAD`.
    ///
    /// # Panics
    /// Panics on any `git2` error — acceptable for test infrastructure.
    pub fn tag_head(&self, name: &str) {
        let head = self.repo.head().expect("read HEAD").peel_to_commit().expect("peel HEAD");
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .expect("create tag");
    }

    /// Create a branch pointing at the current `HEAD`.
    ///
    /// # Panics
    /// Panics on any `git2` error — acceptable for test infrastructure.
    pub fn branch(&self, name: &str) {
        let head = self.repo.head().expect("read HEAD").peel_to_commit().expect("peel HEAD");
        self.repo.branch(name, &head, false).expect("create branch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_single_commit_repo() {
        let fixture = FixtureRepo::init();
        fixture.write_file("src/main.rs", "fn main() {}\n");
        let sha = fixture.commit_all("initial commit", "Alice", "alice@example.com", Utc::now());
        assert_eq!(sha.len(), 40);

        let repo = git2::Repository::open(fixture.path()).expect("reopen fixture repo");
        let head = repo.head().expect("read HEAD").peel_to_commit().expect("peel HEAD");
        assert_eq!(head.id().to_string(), sha);
        assert_eq!(head.message().unwrap_or_default(), "initial commit");
    }

    #[test]
    fn supports_multiple_commits_and_tags() {
        let fixture = FixtureRepo::init();
        fixture.write_file("a.txt", "one");
        fixture.commit_all("first", "Bob", "bob@example.com", Utc::now());
        fixture.write_file("a.txt", "two");
        fixture.commit_all("second", "Bob", "bob@example.com", Utc::now());
        fixture.tag_head("v1");

        let repo = git2::Repository::open(fixture.path()).expect("reopen fixture repo");
        assert!(repo.revparse_single("refs/tags/v1").is_ok());
    }
}
