//! Core data model: chunks, graph nodes/edges, and their metadata payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EMBEDDING_DIM: usize = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkType {
    Function,
    Method,
    Class,
    Interface,
    Module,
    FallbackFixed,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Function => "FUNCTION",
            ChunkType::Method => "METHOD",
            ChunkType::Class => "CLASS",
            ChunkType::Interface => "INTERFACE",
            ChunkType::Module => "MODULE",
            ChunkType::FallbackFixed => "FALLBACK_FIXED",
        }
    }
}

/// A parameter in an extracted function/method signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    pub is_optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Signature {
    pub function_name: String,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub is_async: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Complexity {
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub lines_of_code: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallContext {
    pub call_name: String,
    pub is_conditional: bool,
    pub is_loop: bool,
    pub scope_type: String,
    pub scope_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LspType {
    Class,
    Method,
    Function,
    Interface,
    Module,
}

/// Everything `mnemolite-core::metadata` can extract from a parsed unit.
/// Every field is optional: extraction degrades gracefully to empty defaults
/// rather than propagating an error past the orchestration layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub calls: Vec<String>,
    #[serde(default)]
    pub call_contexts: Vec<CallContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default)]
    pub type_hints: HashMap<String, String>,
    pub is_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsp_type: Option<LspType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// A semantic unit of source code: one function, method, class, interface,
/// module, or (on parse failure) a fixed-size fallback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: Uuid,
    pub repository: String,
    pub file_path: String,
    pub language: String,
    pub chunk_type: ChunkType,
    pub name: String,
    pub name_path: String,
    pub source_code: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_text: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_code: Option<Vec<f32>>,
    pub metadata: ChunkMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    pub indexed_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl CodeChunk {
    /// Natural key used for per-file rewrite (delete-existing, then insert).
    pub fn natural_key(&self) -> (&str, u32, u32, &str) {
        (&self.file_path, self.start_line, self.end_line, &self.repository)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.source_code.is_empty() {
            return Err("source_code must be non-empty".to_string());
        }
        if let Some(e) = &self.embedding_text {
            if e.len() != EMBEDDING_DIM {
                return Err(format!("embedding_text has {} dims, expected {EMBEDDING_DIM}", e.len()));
            }
        }
        if let Some(e) = &self.embedding_code {
            if e.len() != EMBEDDING_DIM {
                return Err(format!("embedding_code has {} dims, expected {EMBEDDING_DIM}", e.len()));
            }
        }
        if !(self.name_path == self.name || self.name_path.ends_with(&format!(".{}", self.name))) {
            return Err("name_path must end with `.{name}` or equal name".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Function,
    Method,
    Class,
    Interface,
    Module,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Function => "function",
            NodeType::Method => "method",
            NodeType::Class => "class",
            NodeType::Interface => "interface",
            NodeType::Module => "module",
        }
    }

    pub fn from_lsp_type(lsp: LspType) -> Self {
        match lsp {
            LspType::Class => NodeType::Class,
            LspType::Method => NodeType::Method,
            LspType::Function => NodeType::Function,
            LspType::Interface => NodeType::Interface,
            LspType::Module => NodeType::Module,
        }
    }

    pub fn from_chunk_type(ct: ChunkType) -> Self {
        match ct {
            ChunkType::Function => NodeType::Function,
            ChunkType::Method => NodeType::Method,
            ChunkType::Class => NodeType::Class,
            ChunkType::Interface => NodeType::Interface,
            ChunkType::Module | ChunkType::FallbackFixed => NodeType::Module,
        }
    }
}

/// A named callable/type. `label` is a (possibly truncated) display name;
/// `properties.name` always carries the untruncated name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub node_id: Uuid,
    pub node_type: NodeType,
    pub label: String,
    pub properties: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

const LABEL_MAX_LEN: usize = 60;

impl GraphNode {
    pub fn truncate_label(name: &str) -> String {
        if name.chars().count() <= LABEL_MAX_LEN {
            name.to_string()
        } else {
            let truncated: String = name.chars().take(LABEL_MAX_LEN - 1).collect();
            format!("{truncated}…")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Calls,
    Imports,
    Extends,
    Uses,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Calls => "calls",
            RelationType::Imports => "imports",
            RelationType::Extends => "extends",
            RelationType::Uses => "uses",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub edge_id: Uuid,
    pub source_node_id: Uuid,
    pub target_node_id: Uuid,
    pub relation_type: RelationType,
    pub properties: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(name_path: &str, name: &str) -> CodeChunk {
        CodeChunk {
            id: Uuid::nil(),
            repository: "r".into(),
            file_path: "f.py".into(),
            language: "python".into(),
            chunk_type: ChunkType::Function,
            name: name.into(),
            name_path: name_path.into(),
            source_code: "def f(): pass".into(),
            start_line: 1,
            end_line: 2,
            embedding_text: None,
            embedding_code: None,
            metadata: ChunkMetadata::default(),
            commit_hash: None,
            indexed_at: Utc::now(),
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn validate_rejects_empty_source() {
        let mut c = chunk("f.add", "add");
        c.source_code = String::new();
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_wrong_embedding_dim() {
        let mut c = chunk("f.add", "add");
        c.embedding_text = Some(vec![0.0; 10]);
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_accepts_name_path_equal_to_name() {
        let c = chunk("add", "add");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn truncate_label_preserves_short_names() {
        assert_eq!(GraphNode::truncate_label("add"), "add");
    }

    #[test]
    fn truncate_label_ellipsizes_long_names() {
        let long = "a".repeat(100);
        let truncated = GraphNode::truncate_label(&long);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncated.chars().count(), LABEL_MAX_LEN);
    }
}
