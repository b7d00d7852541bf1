//! Graph builder (C9): one node per chunk, one edge per resolved call.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::metadata::lsp_type_for_chunk_type;
use crate::model::{CodeChunk, GraphEdge, GraphNode, NodeType, RelationType};

const ANONYMOUS_NAMES: &[&str] = &["<anonymous>", "", "lambda", "<lambda>"];

fn is_anonymous(name: &str) -> bool {
    ANONYMOUS_NAMES.contains(&name) || name.starts_with("anonymous_")
}

pub struct GraphBuildResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

struct ResolutionIndex {
    /// Fully-qualified name_path -> node id. Unique by construction (a
    /// repository shouldn't produce duplicate name_paths, but the last
    /// write wins if it does).
    by_name_path: HashMap<String, Uuid>,
    /// (file_path, simple_name) -> candidate node ids, in insertion order.
    by_file_and_name: HashMap<(String, String), Vec<Uuid>>,
    /// simple_name -> candidate node ids, repository-wide, insertion order.
    by_name: HashMap<String, Vec<Uuid>>,
    /// node id -> (file_path, name_path length) for tie-breaking.
    node_info: HashMap<Uuid, (String, usize)>,
}

impl ResolutionIndex {
    fn new() -> Self {
        Self {
            by_name_path: HashMap::new(),
            by_file_and_name: HashMap::new(),
            by_name: HashMap::new(),
            node_info: HashMap::new(),
        }
    }

    fn insert(&mut self, chunk: &CodeChunk, node_id: Uuid) {
        self.by_name_path.insert(chunk.name_path.clone(), node_id);
        self.by_file_and_name
            .entry((chunk.file_path.clone(), chunk.name.clone()))
            .or_default()
            .push(node_id);
        self.by_name.entry(chunk.name.clone()).or_default().push(node_id);
        self.node_info
            .insert(node_id, (chunk.file_path.clone(), chunk.name_path.len()));
    }

    /// Deterministic tie-break among ambiguous simple-name candidates:
    /// shortest `name_path` first, then lexical by node id (stable, since
    /// UUIDs are otherwise incomparable in a meaningful way — this is a
    /// documented open-question resolution, not a claim of semantic
    /// ordering).
    fn pick_best(&self, candidates: &[Uuid]) -> Option<Uuid> {
        candidates
            .iter()
            .copied()
            .min_by_key(|id| {
                let (_, len) = self.node_info.get(id).cloned().unwrap_or_default();
                (len, *id)
            })
    }

    fn resolve(&self, callee: &str, caller_file: &str) -> Option<Uuid> {
        if let Some(id) = self.by_name_path.get(callee) {
            return Some(*id);
        }
        let simple_name = callee.rsplit('.').next().unwrap_or(callee);
        if let Some(candidates) = self.by_file_and_name.get(&(caller_file.to_string(), simple_name.to_string())) {
            if let Some(id) = self.pick_best(candidates) {
                return Some(id);
            }
        }
        if let Some(candidates) = self.by_name.get(simple_name) {
            if let Some(id) = self.pick_best(candidates) {
                return Some(id);
            }
        }
        None
    }
}

/// Builds the full node/edge set for one repository's chunks. The caller is
/// responsible for committing the result inside a single transaction and
/// for replacing any prior graph state for the repository atomically.
pub fn build_graph(repository: &str, chunks: &[CodeChunk]) -> GraphBuildResult {
    let mut nodes = Vec::with_capacity(chunks.len());
    let mut index = ResolutionIndex::new();
    let mut node_by_chunk: HashMap<Uuid, Uuid> = HashMap::new();
    let mut chunk_by_node: HashMap<Uuid, &CodeChunk> = HashMap::new();

    for (i, chunk) in chunks.iter().enumerate() {
        if is_anonymous(&chunk.name) {
            continue;
        }
        let name = if chunk.name.is_empty() {
            format!("{}_{}", chunk.chunk_type.as_str().to_lowercase(), i)
        } else {
            chunk.name.clone()
        };
        let node_type = chunk
            .metadata
            .lsp_type
            .map(NodeType::from_lsp_type)
            .unwrap_or_else(|| NodeType::from_chunk_type(chunk.chunk_type));
        let node_id = Uuid::new_v4();
        let lsp_type = chunk
            .metadata
            .lsp_type
            .unwrap_or_else(|| lsp_type_for_chunk_type(chunk.chunk_type));

        let node = GraphNode {
            node_id,
            node_type,
            label: GraphNode::truncate_label(&name),
            properties: json!({
                "repository": repository,
                "file_path": chunk.file_path,
                "name": name,
                "language": chunk.language,
                "lsp_type": format!("{lsp_type:?}").to_lowercase(),
                "type": node_type.as_str(),
                "chunk_id": chunk.id,
            }),
            created_at: Utc::now(),
        };

        index.insert(chunk, node_id);
        node_by_chunk.insert(chunk.id, node_id);
        chunk_by_node.insert(node_id, chunk);
        nodes.push(node);
    }

    let mut edges = Vec::new();
    for chunk in chunks {
        let Some(&source_node_id) = node_by_chunk.get(&chunk.id) else { continue };
        for callee in &chunk.metadata.calls {
            let Some(target_node_id) = index.resolve(callee, &chunk.file_path) else { continue };
            if target_node_id == source_node_id {
                continue; // no self-loops for `calls`
            }
            edges.push(GraphEdge {
                edge_id: Uuid::new_v4(),
                source_node_id,
                target_node_id,
                relation_type: RelationType::Calls,
                properties: json!({ "callee": callee }),
                created_at: Utc::now(),
            });
        }
        for import in &chunk.metadata.imports {
            if let Some(target_node_id) = index.by_name_path.get(import).copied() {
                if target_node_id != source_node_id {
                    edges.push(GraphEdge {
                        edge_id: Uuid::new_v4(),
                        source_node_id,
                        target_node_id,
                        relation_type: RelationType::Imports,
                        properties: json!({ "module": import }),
                        created_at: Utc::now(),
                    });
                }
            }
        }
    }

    GraphBuildResult { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChunkMetadata, ChunkType};

    fn chunk(file: &str, name: &str, name_path: &str, calls: Vec<&str>) -> CodeChunk {
        let now = Utc::now();
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "R1".into(),
            file_path: file.into(),
            language: "python".into(),
            chunk_type: ChunkType::Function,
            name: name.into(),
            name_path: name_path.into(),
            source_code: "x".into(),
            start_line: 1,
            end_line: 2,
            embedding_text: None,
            embedding_code: None,
            metadata: ChunkMetadata { calls: calls.into_iter().map(String::from).collect(), ..Default::default() },
            commit_hash: None,
            indexed_at: now,
            last_modified: now,
        }
    }

    #[test]
    fn builds_one_node_per_chunk() {
        let chunks = vec![chunk("a.py", "foo", "a.foo", vec![]), chunk("b.py", "bar", "b.bar", vec![])];
        let result = build_graph("R1", &chunks);
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges.len(), 0);
    }

    #[test]
    fn resolves_call_by_fully_qualified_name_path() {
        let chunks = vec![
            chunk("a.py", "foo", "a.foo", vec!["b.bar"]),
            chunk("b.py", "bar", "b.bar", vec![]),
        ];
        let result = build_graph("R1", &chunks);
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].relation_type, RelationType::Calls);
    }

    #[test]
    fn qualified_resolution_disambiguates_same_simple_name() {
        let chunks = vec![
            chunk("models/user.py", "User", "models.user.User", vec![]),
            chunk("admin/user.py", "User", "admin.user.User", vec![]),
            chunk("c.py", "make", "c.make", vec!["models.user.User"]),
        ];
        let result = build_graph("R1", &chunks);
        assert_eq!(result.edges.len(), 1);
        let target = result.nodes.iter().find(|n| n.node_id == result.edges[0].target_node_id).unwrap();
        assert_eq!(target.properties["file_path"], "models/user.py");
    }

    #[test]
    fn unresolved_calls_are_dropped_silently() {
        let chunks = vec![chunk("a.py", "foo", "a.foo", vec!["nonexistent"])];
        let result = build_graph("R1", &chunks);
        assert_eq!(result.edges.len(), 0);
    }

    #[test]
    fn anonymous_chunks_produce_no_node() {
        let chunks = vec![chunk("a.py", "<anonymous>", "a.<anonymous>", vec![])];
        let result = build_graph("R1", &chunks);
        assert_eq!(result.nodes.len(), 0);
    }

    #[test]
    fn no_self_loop_for_calls() {
        let chunks = vec![chunk("a.py", "foo", "a.foo", vec!["a.foo"])];
        let result = build_graph("R1", &chunks);
        assert_eq!(result.edges.len(), 0);
    }
}
