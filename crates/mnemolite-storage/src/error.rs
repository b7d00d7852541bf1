//! Storage error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("chunk validation failed: {0}")]
    InvalidChunk(String),

    #[error("node '{id}' not found")]
    NodeNotFound { id: uuid::Uuid },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn node_not_found(id: uuid::Uuid) -> Self {
        Self::NodeNotFound { id }
    }
}
