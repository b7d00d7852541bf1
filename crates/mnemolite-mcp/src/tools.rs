//! MCP tool parameter definitions.
//!
//! These structs define the JSON Schema for tool parameters using schemars.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Parameters for the `search_code` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchCodeParams {
    #[schemars(description = "Natural-language or identifier query")]
    pub query: String,

    #[schemars(description = "Restrict results to this repository")]
    pub repository: Option<String>,

    #[schemars(description = "Restrict results to this language (e.g. \"python\", \"rust\")")]
    pub language: Option<String>,

    #[schemars(description = "Restrict results to this chunk type (\"function\", \"method\", \"class\", \"interface\", \"module\")")]
    pub chunk_type: Option<String>,

    #[schemars(description = "Maximum results to return (default 10)")]
    pub limit: Option<usize>,

    #[schemars(description = "Apply the cross-encoder rerank pass over the fused candidate pool (default true)")]
    pub rerank: Option<bool>,
}

/// Parameters for the `indexing_status` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IndexingStatusParams {
    #[schemars(description = "Repository to check the batch indexing job status for")]
    pub repository: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_code_params_accepts_query_only() {
        let params: SearchCodeParams = serde_json::from_str(r#"{"query": "parse config file"}"#).unwrap();
        assert_eq!(params.query, "parse config file");
        assert!(params.repository.is_none());
        assert!(params.limit.is_none());
    }

    #[test]
    fn search_code_params_rejects_missing_query() {
        let result: Result<SearchCodeParams, _> = serde_json::from_str(r#"{"repository": "acme/widgets"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn indexing_status_params_requires_repository() {
        let result: Result<IndexingStatusParams, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }
}
