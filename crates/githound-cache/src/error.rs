//! Cache error types

use githound_common::define_error_enum;

define_error_enum! {
    pub enum CacheError {
        #[error("serialization error: {0}")]
        Serialization(String),

        #[error("compression error: {0}")]
        Compression(String),

        #[error("invalid glob pattern: {0}")]
        InvalidPattern(String),
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<globset::Error> for CacheError {
    fn from(e: globset::Error) -> Self {
        Self::InvalidPattern(e.to_string())
    }
}
