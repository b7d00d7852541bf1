//! Computed metrics (supplement to §3 `ComputedMetrics`): coupling,
//! PageRank-style centrality, and call-context edge weights, run as a pass
//! over the graph builder's output.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use uuid::Uuid;

use crate::model::{CallContext, GraphEdge, GraphNode, RelationType};

const DAMPING: f64 = 0.85;
const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    pub afferent_coupling: u32,
    pub efferent_coupling: u32,
    pub instability: f64,
    pub centrality: f64,
}

pub struct ComputedMetricsPass {
    pub per_node: HashMap<Uuid, NodeMetrics>,
    pub version: u32,
}

/// Discounts applied to `calls` edge weight based on the originating call
/// site's context (grounded on the conditional/loop call-context fields
/// the metadata extractor records).
fn edge_weight_for_context(contexts: &[CallContext], callee: &str) -> f64 {
    contexts
        .iter()
        .find(|c| c.call_name == callee)
        .map(|c| match (c.is_conditional, c.is_loop) {
            (true, _) => 0.5,
            (false, true) => 0.75,
            (false, false) => 1.0,
        })
        .unwrap_or(1.0)
}

pub fn compute_edge_weight(edge: &GraphEdge, call_contexts_by_source: &HashMap<Uuid, Vec<CallContext>>) -> f64 {
    if edge.relation_type != RelationType::Calls {
        return 1.0;
    }
    let callee = edge
        .properties
        .get("callee")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    call_contexts_by_source
        .get(&edge.source_node_id)
        .map(|ctxs| edge_weight_for_context(ctxs, callee))
        .unwrap_or(1.0)
}

fn build_petgraph(nodes: &[GraphNode], edges: &[GraphEdge]) -> (DiGraph<Uuid, ()>, HashMap<Uuid, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index_of = HashMap::new();
    for node in nodes {
        let idx = graph.add_node(node.node_id);
        index_of.insert(node.node_id, idx);
    }
    for edge in edges {
        if edge.relation_type != RelationType::Calls {
            continue;
        }
        if let (Some(&s), Some(&t)) = (index_of.get(&edge.source_node_id), index_of.get(&edge.target_node_id)) {
            graph.add_edge(s, t, ());
        }
    }
    (graph, index_of)
}

/// Power-iteration PageRank over the `calls` subgraph. Disconnected
/// components are each iterated within the same shared graph (petgraph
/// iterates over all nodes regardless of connectivity), then the whole
/// vector is renormalized once at the end so weights sum to the node
/// count — the resolution adopted for the spec's open PageRank-numerics
/// question.
fn pagerank(graph: &DiGraph<Uuid, ()>) -> HashMap<NodeIndex, f64> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }
    let mut rank: HashMap<NodeIndex, f64> = graph.node_indices().map(|i| (i, 1.0 / n as f64)).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut next: HashMap<NodeIndex, f64> = graph.node_indices().map(|i| (i, (1.0 - DAMPING) / n as f64)).collect();
        for node in graph.node_indices() {
            let out_degree = graph.neighbors(node).count();
            if out_degree == 0 {
                // Dangling node: redistribute its mass uniformly.
                let share = DAMPING * rank[&node] / n as f64;
                for target in graph.node_indices() {
                    *next.get_mut(&target).unwrap() += share;
                }
                continue;
            }
            let share = DAMPING * rank[&node] / out_degree as f64;
            for target in graph.neighbors(node) {
                *next.get_mut(&target).unwrap() += share;
            }
        }
        let delta: f64 = graph.node_indices().map(|i| (next[&i] - rank[&i]).abs()).sum();
        rank = next;
        if delta < TOLERANCE {
            break;
        }
    }

    let sum: f64 = rank.values().sum();
    if sum > 0.0 {
        let scale = n as f64 / sum;
        for v in rank.values_mut() {
            *v *= scale;
        }
    }
    rank
}

fn coupling(graph: &DiGraph<Uuid, ()>) -> HashMap<NodeIndex, (u32, u32)> {
    graph
        .node_indices()
        .map(|i| {
            let ca = graph.neighbors_directed(i, petgraph::Direction::Incoming).count() as u32;
            let ce = graph.neighbors_directed(i, petgraph::Direction::Outgoing).count() as u32;
            (i, (ca, ce))
        })
        .collect()
}

pub fn compute(nodes: &[GraphNode], edges: &[GraphEdge], version: u32) -> ComputedMetricsPass {
    let (graph, index_of) = build_petgraph(nodes, edges);
    let ranks = pagerank(&graph);
    let couplings = coupling(&graph);

    let mut per_node = HashMap::new();
    for node in nodes {
        let Some(&idx) = index_of.get(&node.node_id) else { continue };
        let (ca, ce) = couplings.get(&idx).copied().unwrap_or((0, 0));
        let instability = if ca + ce == 0 { 0.0 } else { ce as f64 / (ca + ce) as f64 };
        per_node.insert(
            node.node_id,
            NodeMetrics {
                afferent_coupling: ca,
                efferent_coupling: ce,
                instability,
                centrality: ranks.get(&idx).copied().unwrap_or(0.0),
            },
        );
    }

    ComputedMetricsPass { per_node, version }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn node(id: Uuid) -> GraphNode {
        GraphNode {
            node_id: id,
            node_type: crate::model::NodeType::Function,
            label: "f".into(),
            properties: json!({}),
            created_at: Utc::now(),
        }
    }

    fn edge(source: Uuid, target: Uuid) -> GraphEdge {
        GraphEdge {
            edge_id: Uuid::new_v4(),
            source_node_id: source,
            target_node_id: target,
            relation_type: RelationType::Calls,
            properties: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pagerank_sums_to_node_count() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let nodes = vec![node(a), node(b)];
        let edges = vec![edge(a, b)];
        let pass = compute(&nodes, &edges, 1);
        let sum: f64 = pass.per_node.values().map(|m| m.centrality).sum();
        assert!((sum - 2.0).abs() < 1e-6);
    }

    #[test]
    fn coupling_reflects_in_out_degree() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let nodes = vec![node(a), node(b)];
        let edges = vec![edge(a, b)];
        let pass = compute(&nodes, &edges, 1);
        assert_eq!(pass.per_node[&a].efferent_coupling, 1);
        assert_eq!(pass.per_node[&b].afferent_coupling, 1);
    }

    #[test]
    fn isolated_node_has_zero_instability() {
        let a = Uuid::new_v4();
        let nodes = vec![node(a)];
        let pass = compute(&nodes, &[], 1);
        assert_eq!(pass.per_node[&a].instability, 0.0);
    }
}
