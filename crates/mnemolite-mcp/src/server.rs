//! MnemoLite MCP server implementation.
//!
//! Implements the MCP server using the rmcp SDK, exposing two tools:
//! - `search_code`: hybrid lexical + vector search over indexed chunks
//! - `indexing_status`: batch indexing job progress for a repository

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use tracing::debug;

use mnemolite_search::HybridSearcher;
use mnemolite_storage::ChunkRepository;
use mnemolite_stream::StatusRepository;

use crate::tools::{IndexingStatusParams, SearchCodeParams};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_POOL_SIZE: usize = 50;
const SNIPPET_MAX_CHARS: usize = 400;

#[derive(Clone)]
pub struct MnemoliteServer {
    searcher: Arc<HybridSearcher>,
    chunks: Arc<ChunkRepository>,
    status: Arc<StatusRepository>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MnemoliteServer {
    pub fn new(searcher: Arc<HybridSearcher>, chunks: Arc<ChunkRepository>, status: Arc<StatusRepository>) -> Self {
        Self {
            searcher,
            chunks,
            status,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "search_code",
        description = "Find code entities by name or natural-language description. Fuses lexical trigram matches with vector similarity and optionally reranks the pooled results. Returns file location, qualified name, and a source snippet per hit."
    )]
    async fn search_code(
        &self,
        Parameters(params): Parameters<SearchCodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let enable_rerank = params.rerank.unwrap_or(true);

        debug!(query = params.query, limit, "search_code");

        let filters = mnemolite_search::HybridFilters {
            repository: params.repository.clone(),
            language: params.language.clone(),
            chunk_type: params.chunk_type.clone(),
            file_path_contains: None,
        };

        let hits = self
            .searcher
            .search(&params.query, &filters, limit, enable_rerank, DEFAULT_POOL_SIZE)
            .await
            .map_err(|e| McpError::internal_error(format!("search failed: {e}"), None))?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in &hits {
            let chunk = self
                .chunks
                .get_by_id(hit.chunk_id)
                .await
                .map_err(|e| McpError::internal_error(format!("chunk lookup failed: {e}"), None))?;

            let Some(chunk) = chunk else { continue };

            results.push(serde_json::json!({
                "chunk_id": hit.chunk_id,
                "name_path": chunk.name_path,
                "chunk_type": chunk.chunk_type.as_str(),
                "file_path": chunk.file_path,
                "language": chunk.language,
                "start_line": chunk.start_line,
                "end_line": chunk.end_line,
                "rrf_score": hit.rrf_score,
                "rerank_score": hit.rerank_score,
                "snippet": truncate_snippet(&chunk.source_code, SNIPPET_MAX_CHARS),
            }));
        }

        let response = serde_json::json!({
            "query": params.query,
            "result_count": results.len(),
            "results": results,
        });

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }

    #[tool(
        name = "indexing_status",
        description = "Check the batch indexing job status for a repository: files processed/failed, current batch, and terminal status (completed/partial/failed)."
    )]
    async fn indexing_status(
        &self,
        Parameters(params): Parameters<IndexingStatusParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(repository = params.repository, "indexing_status");

        let status = self
            .status
            .get(&params.repository)
            .await
            .map_err(|e| McpError::internal_error(format!("status lookup failed: {e}"), None))?;

        let response = match status {
            Some(status) => serde_json::json!({
                "repository": params.repository,
                "job_id": status.job_id,
                "status": status.status,
                "total_files": status.total_files,
                "processed_files": status.processed_files,
                "failed_files": status.failed_files,
                "current_batch": status.current_batch,
                "total_batches": status.total_batches,
                "started_at": status.started_at,
                "completed_at": status.completed_at,
            }),
            None => serde_json::json!({
                "repository": params.repository,
                "status": "not_found",
            }),
        };

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_default(),
        )]))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for MnemoliteServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "MnemoLite: hybrid code search over an indexed corpus.\n\n\
                TOOLS:\n\
                - search_code: lexical + vector hybrid search, optionally reranked\n\
                - indexing_status: check a repository's batch indexing progress"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn truncate_snippet(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len])
    }
}
