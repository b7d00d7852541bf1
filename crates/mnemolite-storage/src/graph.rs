//! `nodes`/`edges` repository: per-repository graph replace.

use chrono::{DateTime, Utc};
use mnemolite_core::{GraphEdge, GraphNode, NodeType, RelationType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StorageError;

pub struct GraphRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct NodeRow {
    node_id: Uuid,
    node_type: String,
    label: String,
    properties: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn node_type_from_str(s: &str) -> NodeType {
    match s {
        "method" => NodeType::Method,
        "class" => NodeType::Class,
        "interface" => NodeType::Interface,
        "module" => NodeType::Module,
        _ => NodeType::Function,
    }
}

impl From<NodeRow> for GraphNode {
    fn from(row: NodeRow) -> Self {
        GraphNode {
            node_id: row.node_id,
            node_type: node_type_from_str(&row.node_type),
            label: row.label,
            properties: row.properties,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    edge_id: Uuid,
    source_node_id: Uuid,
    target_node_id: Uuid,
    relation_type: String,
    properties: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn relation_type_from_str(s: &str) -> RelationType {
    match s {
        "imports" => RelationType::Imports,
        "extends" => RelationType::Extends,
        "uses" => RelationType::Uses,
        _ => RelationType::Calls,
    }
}

impl From<EdgeRow> for GraphEdge {
    fn from(row: EdgeRow) -> Self {
        GraphEdge {
            edge_id: row.edge_id,
            source_node_id: row.source_node_id,
            target_node_id: row.target_node_id,
            relation_type: relation_type_from_str(&row.relation_type),
            properties: row.properties,
            created_at: row.created_at,
        }
    }
}

impl GraphRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replaces every node/edge for `repository` with `nodes`/`edges` in one
    /// transaction: observers see either the old graph or the new one, never
    /// a partial mix.
    pub async fn replace_graph(
        &self,
        repository: &str,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM nodes WHERE properties ->> 'repository' = $1")
            .bind(repository)
            .execute(&mut *tx)
            .await?;

        for node in nodes {
            sqlx::query(
                "INSERT INTO nodes (node_id, node_type, label, properties, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(node.node_id)
            .bind(node.node_type.as_str())
            .bind(&node.label)
            .bind(&node.properties)
            .bind(node.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for edge in edges {
            sqlx::query(
                "INSERT INTO edges (edge_id, source_node_id, target_node_id, relation_type, properties, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(edge.edge_id)
            .bind(edge.source_node_id)
            .bind(edge.target_node_id)
            .bind(edge.relation_type.as_str())
            .bind(&edge.properties)
            .bind(edge.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn nodes_for_repository(&self, repository: &str) -> Result<Vec<GraphNode>, StorageError> {
        let rows: Vec<NodeRow> = sqlx::query_as(
            "SELECT node_id, node_type, label, properties, created_at
             FROM nodes WHERE properties ->> 'repository' = $1",
        )
        .bind(repository)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GraphNode::from).collect())
    }

    pub async fn edges_for_node(
        &self,
        node_id: Uuid,
        direction: Direction,
    ) -> Result<Vec<GraphEdge>, StorageError> {
        let rows: Vec<EdgeRow> = match direction {
            Direction::Outgoing => {
                sqlx::query_as(
                    "SELECT edge_id, source_node_id, target_node_id, relation_type, properties, created_at
                     FROM edges WHERE source_node_id = $1",
                )
                .bind(node_id)
                .fetch_all(&self.pool)
                .await?
            }
            Direction::Incoming => {
                sqlx::query_as(
                    "SELECT edge_id, source_node_id, target_node_id, relation_type, properties, created_at
                     FROM edges WHERE target_node_id = $1",
                )
                .bind(node_id)
                .fetch_all(&self.pool)
                .await?
            }
            Direction::Both => {
                sqlx::query_as(
                    "SELECT edge_id, source_node_id, target_node_id, relation_type, properties, created_at
                     FROM edges WHERE source_node_id = $1 OR target_node_id = $1",
                )
                .bind(node_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(GraphEdge::from).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_round_trips_through_as_str() {
        for nt in [
            NodeType::Function,
            NodeType::Method,
            NodeType::Class,
            NodeType::Interface,
            NodeType::Module,
        ] {
            assert_eq!(node_type_from_str(nt.as_str()), nt);
        }
    }

    #[test]
    fn relation_type_round_trips_through_as_str() {
        for rt in [
            RelationType::Calls,
            RelationType::Imports,
            RelationType::Extends,
            RelationType::Uses,
        ] {
            assert_eq!(relation_type_from_str(rt.as_str()), rt);
        }
    }
}
