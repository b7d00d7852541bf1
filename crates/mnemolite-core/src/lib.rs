//! MnemoLite Core — chunking, metadata extraction, symbol-path naming and
//! graph construction.
//!
//! - Tree-sitter AST parsing across eight languages
//! - Chunker (C3): source -> semantic units, with fixed-window fallback
//! - Metadata extractor (C4): imports, calls, signature, complexity
//! - Symbol-path service (§4.7): hierarchical qualified names
//! - Graph builder (C9): chunk -> node, resolved `calls`/`imports` -> edge
//! - Computed metrics: coupling and PageRank-style centrality

pub mod chunker;
pub mod graph;
pub mod metadata;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod symbol_path;

pub use chunker::{chunk, fixed_window_chunks, ChunkerError, DEFAULT_MAX_CHUNK_SIZE};
pub use graph::{build_graph, GraphBuildResult};
pub use metadata::{extract_metadata, lsp_type_for_chunk_type};
pub use metrics::{compute as compute_metrics, compute_edge_weight, ComputedMetricsPass, NodeMetrics};
pub use model::{
    CallContext, ChunkMetadata, ChunkType, CodeChunk, Complexity, GraphEdge, GraphNode, LspType,
    NodeType, Parameter, RelationType, Signature, EMBEDDING_DIM,
};
pub use parser::{CodeParser, ParserError, SupportedLanguage};
pub use symbol_path::{
    extract_parent_context, file_to_module_path, generate_name_path, is_qualified_query,
    parents_overlap_without_nesting, ParentContext,
};
