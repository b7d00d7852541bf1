//! Cache error taxonomy. Cache failures never propagate as observable
//! errors from the cascade — this enum exists for the narrower surface of
//! the migration tool and explicit layer operations.

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("L2 backend unavailable: {0}")]
    L2Unavailable(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid content hash '{0}', expected 32 hex characters")]
    InvalidHash(String),
}
