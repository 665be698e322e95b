//! Git collaborator error types

use githound_common::define_error_enum;

define_error_enum! {
    pub enum GitError {
        #[error("not a git repository: {0}")]
        NotARepository(String),

        #[error("git2 error: {0}")]
        Git2(String),
    }
}

impl From<git2::Error> for GitError {
    fn from(e: git2::Error) -> Self {
        Self::Git2(e.to_string())
    }
}
