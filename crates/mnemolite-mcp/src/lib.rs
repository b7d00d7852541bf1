//! MnemoLite MCP - MCP server exposing hybrid code search to AI assistants.
//!
//! # Tools
//!
//! - **search_code**: lexical + vector hybrid search, optionally reranked
//! - **indexing_status**: batch indexing job progress for a repository

pub mod error;
pub mod server;
pub mod tools;

pub use error::{McpError, Result};
pub use server::MnemoliteServer;
