//! Search error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("embedding generation failed: {0}")]
    Embedding(String),

    #[error("storage error: {0}")]
    Storage(#[from] mnemolite_storage::StorageError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("resilience error: {0}")]
    Timeout(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("rerank model not configured")]
    RerankDisabled,
}
