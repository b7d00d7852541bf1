//! Hybrid search orchestration (C13): fans out lexical and vector search
//! concurrently, fuses with RRF, optionally reranks, and trims to the
//! caller's requested limit.

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use mnemolite_storage::{ChunkRepository, VectorDomain, VectorFilters, VectorSearcher};
use mnemolite_resilience::with_timeout;

use crate::embedder::{Embedder, Role};
use crate::error::Result;
use crate::lexical::{LexicalFilters, LexicalSearcher};
use crate::rerank::{CrossEncoderReranker, RerankCandidate};
use crate::rrf::{self, FusedResult};

const LEXICAL_LEG_TIMEOUT: Duration = Duration::from_secs(5);
const VECTOR_LEG_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
pub struct HybridFilters {
    pub repository: Option<String>,
    pub language: Option<String>,
    pub chunk_type: Option<String>,
    pub file_path_contains: Option<String>,
}

impl HybridFilters {
    fn lexical(&self) -> LexicalFilters {
        LexicalFilters {
            repository: self.repository.clone(),
            language: self.language.clone(),
            chunk_type: self.chunk_type.clone(),
            file_path_contains: self.file_path_contains.clone(),
        }
    }

    fn vector(&self) -> VectorFilters {
        VectorFilters {
            repository: self.repository.clone(),
            language: self.language.clone(),
            chunk_type: self.chunk_type.clone(),
        }
    }
}

pub struct HybridSearchResult {
    pub chunk_id: Uuid,
    pub rrf_score: f64,
    pub rank: usize,
    pub rerank_score: Option<f32>,
}

pub struct HybridSearcher {
    embedder: Embedder,
    lexical: LexicalSearcher,
    vector: VectorSearcher,
    chunks: ChunkRepository,
    reranker: Option<CrossEncoderReranker>,
}

impl HybridSearcher {
    pub fn new(
        embedder: Embedder,
        lexical: LexicalSearcher,
        vector: VectorSearcher,
        chunks: ChunkRepository,
    ) -> Self {
        Self {
            embedder,
            lexical,
            vector,
            chunks,
            reranker: None,
        }
    }

    pub fn with_reranker(mut self, reranker: CrossEncoderReranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// `search(query, filters, limit, enable_rerank, pool_size)`: embeds the
    /// query once, fans `Lexical.search` and `VectorStore.nearest` out
    /// concurrently with independent 5s timeouts, fuses both ranked lists
    /// with RRF (k=60), optionally reranks the fused pool, and trims to
    /// `limit`. A leg that times out contributes an empty list rather than
    /// failing the whole query.
    pub async fn search(
        &self,
        query: &str,
        filters: &HybridFilters,
        limit: usize,
        enable_rerank: bool,
        pool_size: usize,
    ) -> Result<Vec<HybridSearchResult>> {
        let query_embedding = self
            .embedder
            .embed_text(vec![query.to_string()], Role::Query)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let lexical_filters = filters.lexical();
        let vector_filters = filters.vector();

        let (lexical_ids, vector_ids) = tokio::join!(
            self.search_lexical_leg(query, &lexical_filters, pool_size),
            self.search_vector_leg(&query_embedding, &vector_filters, pool_size),
        );

        let fused = rrf::fuse(&[lexical_ids, vector_ids], rrf::DEFAULT_K);
        let pooled: Vec<FusedResult> = fused.into_iter().take(pool_size).collect();

        let reranked = if enable_rerank {
            self.rerank_pool(query, pooled).await?
        } else {
            pooled
                .into_iter()
                .map(|f| HybridSearchResult {
                    chunk_id: f.chunk_id,
                    rrf_score: f.rrf_score,
                    rank: f.rank,
                    rerank_score: None,
                })
                .collect()
        };

        Ok(reranked.into_iter().take(limit).collect())
    }

    async fn search_lexical_leg(
        &self,
        query: &str,
        filters: &LexicalFilters,
        pool_size: usize,
    ) -> Vec<Uuid> {
        let result = with_timeout(
            "lexical_search",
            LEXICAL_LEG_TIMEOUT,
            HashMap::new(),
            self.lexical.search(query, filters, pool_size),
        )
        .await;

        match result {
            Ok(Ok(hits)) => hits.into_iter().map(|h| h.chunk_id).collect(),
            Ok(Err(_)) | Err(_) => Vec::new(),
        }
    }

    async fn search_vector_leg(
        &self,
        query_embedding: &[f32],
        filters: &VectorFilters,
        pool_size: usize,
    ) -> Vec<Uuid> {
        let result = with_timeout(
            "vector_search",
            VECTOR_LEG_TIMEOUT,
            HashMap::new(),
            self.vector
                .nearest(query_embedding, VectorDomain::Code, filters, pool_size),
        )
        .await;

        match result {
            Ok(Ok(hits)) => hits.into_iter().map(|h| h.chunk_id).collect(),
            Ok(Err(_)) | Err(_) => Vec::new(),
        }
    }

    async fn rerank_pool(&self, query: &str, pooled: Vec<FusedResult>) -> Result<Vec<HybridSearchResult>> {
        let Some(reranker) = &self.reranker else {
            return Ok(pooled
                .into_iter()
                .map(|f| HybridSearchResult {
                    chunk_id: f.chunk_id,
                    rrf_score: f.rrf_score,
                    rank: f.rank,
                    rerank_score: None,
                })
                .collect());
        };

        let mut candidates = Vec::with_capacity(pooled.len());
        for fused in &pooled {
            let Some(chunk) = self.chunks.get_by_id(fused.chunk_id).await? else {
                continue;
            };
            candidates.push(RerankCandidate {
                chunk_id: fused.chunk_id,
                text: chunk.source_code,
                fused_score: fused.rrf_score,
            });
        }

        let reranked = reranker.rerank(query, candidates).await?;
        Ok(reranked
            .into_iter()
            .map(|r| HybridSearchResult {
                chunk_id: r.chunk_id,
                rrf_score: r.fused_score,
                rank: 0,
                rerank_score: Some(r.rerank_score),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hybrid_filters_project_into_lexical_and_vector_filters() {
        let filters = HybridFilters {
            repository: Some("acme/widgets".to_string()),
            language: Some("rust".to_string()),
            chunk_type: None,
            file_path_contains: Some("src/".to_string()),
        };
        let lexical = filters.lexical();
        assert_eq!(lexical.repository.as_deref(), Some("acme/widgets"));
        assert_eq!(lexical.file_path_contains.as_deref(), Some("src/"));

        let vector = filters.vector();
        assert_eq!(vector.repository.as_deref(), Some("acme/widgets"));
        assert_eq!(vector.language.as_deref(), Some("rust"));
    }
}
