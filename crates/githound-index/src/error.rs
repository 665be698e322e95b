//! Indexing error types.

use githound_common::define_error_enum;

define_error_enum! {
    pub enum IndexError {
        #[error("git error: {0}")]
        Git(String),

        #[error("serialization error: {0}")]
        Serialization(String),
    }
}

impl From<githound_git::GitError> for IndexError {
    fn from(e: githound_git::GitError) -> Self {
        Self::Git(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
