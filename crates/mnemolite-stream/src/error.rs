//! Stream/indexing pipeline error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("storage error: {0}")]
    Storage(#[from] mnemolite_storage::StorageError),

    #[error("search error: {0}")]
    Search(#[from] mnemolite_search::SearchError),

    #[error("chunking failed for {file_path}: {source}")]
    Chunking {
        file_path: String,
        #[source]
        source: mnemolite_core::ChunkerError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("batch worker failed: {0}")]
    WorkerFailed(String),

    #[error("batch worker timed out after {0:?}")]
    WorkerTimeout(std::time::Duration),

    #[error("repository scan exceeded the hard cap of {cap} files ({found} found)")]
    FileCapExceeded { cap: usize, found: usize },
}
