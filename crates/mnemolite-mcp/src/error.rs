//! Error types for the MCP server

use thiserror::Error;

/// Result type for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur in the MCP server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("search failed: {0}")]
    Search(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<mnemolite_search::SearchError> for McpError {
    fn from(e: mnemolite_search::SearchError) -> Self {
        McpError::Search(e.to_string())
    }
}

impl From<mnemolite_storage::StorageError> for McpError {
    fn from(e: mnemolite_storage::StorageError) -> Self {
        McpError::Storage(e.to_string())
    }
}
