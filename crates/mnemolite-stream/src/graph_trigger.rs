//! Repository-scoped graph construction (C9), triggered once a job's
//! batches have all completed.

use std::collections::HashMap;

use mnemolite_core::{build_graph, compute_edge_weight, compute_metrics, CallContext, CodeChunk, GraphNode};
use mnemolite_storage::{ChunkRepository, GraphRepository, MetricsRepository};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// Maps each graph node back to the call contexts of the chunk it was built
/// from, keyed by `node_id` - the shape `compute_edge_weight` needs to look
/// up the originating call site's conditional/loop context.
fn call_contexts_by_node(nodes: &[GraphNode], chunks: &[CodeChunk]) -> HashMap<Uuid, Vec<CallContext>> {
    nodes
        .iter()
        .filter_map(|node| {
            let chunk_id = node.properties.get("chunk_id")?.as_str()?;
            let chunk_id = Uuid::parse_str(chunk_id).ok()?;
            let chunk = chunks.iter().find(|c| c.id == chunk_id)?;
            Some((node.node_id, chunk.metadata.call_contexts.clone()))
        })
        .collect()
}

/// Nodes get fresh ids on every rebuild (`replace_graph` deletes and
/// reinserts), so there is nothing to compare a pass against across
/// rebuilds - every rebuild's metrics pass is simply version 1.
const METRICS_PASS_VERSION: i32 = 1;

pub struct GraphTrigger {
    chunks: ChunkRepository,
    graph: GraphRepository,
    metrics: MetricsRepository,
}

impl GraphTrigger {
    pub fn new(chunks: ChunkRepository, graph: GraphRepository, metrics: MetricsRepository) -> Self {
        Self { chunks, graph, metrics }
    }

    /// Reloads every chunk for `repository`, rebuilds the node/edge graph
    /// from scratch, atomically replaces the persisted graph, then runs the
    /// dependent coupling/centrality/edge-weight pass over the fresh graph.
    pub async fn rebuild(&self, repository: &str) -> Result<()> {
        let chunks = self.chunks.list_by_repository(repository).await?;
        let result = build_graph(repository, &chunks);
        info!(
            repository,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            "rebuilt repository graph"
        );
        self.graph.replace_graph(repository, &result.nodes, &result.edges).await?;

        let contexts = call_contexts_by_node(&result.nodes, &chunks);

        let pass = compute_metrics(&result.nodes, &result.edges, METRICS_PASS_VERSION as u32);
        self.metrics.store(&pass).await?;

        let edge_weights: Vec<(Uuid, f64)> = result
            .edges
            .iter()
            .map(|edge| (edge.edge_id, compute_edge_weight(edge, &contexts)))
            .collect();
        self.metrics.store_edge_weights(METRICS_PASS_VERSION, &edge_weights).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_core::{ChunkMetadata, ChunkType};
    use serde_json::json;

    fn chunk_with_contexts(id: Uuid, contexts: Vec<CallContext>) -> CodeChunk {
        let now = Utc::now();
        CodeChunk {
            id,
            repository: "R1".into(),
            file_path: "a.py".into(),
            language: "python".into(),
            chunk_type: ChunkType::Function,
            name: "foo".into(),
            name_path: "a.foo".into(),
            source_code: "x".into(),
            start_line: 1,
            end_line: 2,
            embedding_text: None,
            embedding_code: None,
            metadata: ChunkMetadata { call_contexts: contexts, ..Default::default() },
            commit_hash: None,
            indexed_at: now,
            last_modified: now,
        }
    }

    fn node_for_chunk(chunk_id: Uuid) -> GraphNode {
        GraphNode {
            node_id: Uuid::new_v4(),
            node_type: mnemolite_core::NodeType::Function,
            label: "foo".into(),
            properties: json!({ "chunk_id": chunk_id }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn maps_node_id_to_its_chunks_call_contexts() {
        let chunk_id = Uuid::new_v4();
        let contexts = vec![CallContext {
            call_name: "bar".into(),
            is_conditional: true,
            is_loop: false,
            scope_type: "function".into(),
            scope_name: "foo".into(),
        }];
        let chunk = chunk_with_contexts(chunk_id, contexts.clone());
        let node = node_for_chunk(chunk_id);
        let node_id = node.node_id;

        let map = call_contexts_by_node(&[node], &[chunk]);
        assert_eq!(map.get(&node_id), Some(&contexts));
    }

    #[test]
    fn node_with_no_matching_chunk_is_skipped() {
        let node = node_for_chunk(Uuid::new_v4());
        let map = call_contexts_by_node(&[node], &[]);
        assert!(map.is_empty());
    }
}
