//! Hybrid search (C5, C10-C13): embedding generation, lexical trigram search,
//! vector nearest-neighbor search, reciprocal rank fusion, and an optional
//! cross-encoder rerank pass, composed by [`hybrid::HybridSearcher`].

pub mod embedder;
pub mod embeddings;
pub mod error;
pub mod hybrid;
pub mod lexical;
pub mod rerank;
pub mod rrf;

pub use embedder::{Embedder, Role};
pub use embeddings::{EmbeddingProvider, LocalProvider};
pub use error::{Result, SearchError};
pub use hybrid::{HybridFilters, HybridSearchResult, HybridSearcher};
pub use lexical::{LexicalFilters, LexicalHit, LexicalSearcher};
pub use rerank::{CrossEncoderReranker, RerankCandidate, RerankedResult};
pub use rrf::{fuse, fuse_weighted, FusedResult, DEFAULT_K};
