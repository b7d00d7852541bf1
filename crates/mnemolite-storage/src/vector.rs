//! Vector nearest-neighbor search over `code_chunks.embedding_text` /
//! `embedding_code`, backed by the HNSW cosine indexes declared in the
//! initial migration.

use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorDomain {
    Text,
    Code,
}

impl VectorDomain {
    fn column(self) -> &'static str {
        match self {
            VectorDomain::Text => "embedding_text",
            VectorDomain::Code => "embedding_code",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VectorFilters {
    pub repository: Option<String>,
    pub language: Option<String>,
    pub chunk_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk_id: Uuid,
    /// Cosine similarity in `[-1, 1]`, derived as `1 - cosine_distance`.
    pub similarity: f32,
}

pub struct VectorSearcher {
    pool: PgPool,
}

impl VectorSearcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Nearest neighbors to `query_embedding` in `domain`, ranked by cosine
    /// distance ascending (`<=>` operator, served by the HNSW index on that
    /// column). Rows with a `NULL` embedding in the target domain never match
    /// the index and are excluded implicitly.
    pub async fn nearest(
        &self,
        query_embedding: &[f32],
        domain: VectorDomain,
        filters: &VectorFilters,
        limit: usize,
    ) -> Result<Vec<VectorHit>, StorageError> {
        let column = domain.column();
        let mut sql = format!(
            "SELECT id, 1 - ({column} <=> $1) AS sim
             FROM code_chunks
             WHERE {column} IS NOT NULL"
        );
        let mut bind_idx = 2;
        if filters.repository.is_some() {
            sql.push_str(&format!(" AND repository = ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.language.is_some() {
            sql.push_str(&format!(" AND language = ${bind_idx}"));
            bind_idx += 1;
        }
        if filters.chunk_type.is_some() {
            sql.push_str(&format!(" AND chunk_type = ${bind_idx}"));
            bind_idx += 1;
        }
        sql.push_str(&format!(" ORDER BY {column} <=> $1 LIMIT ${bind_idx}"));

        let vector = Vector::from(query_embedding.to_vec());
        let mut query_builder = sqlx::query_as::<_, (Uuid, f32)>(&sql).bind(vector);
        if let Some(r) = &filters.repository {
            query_builder = query_builder.bind(r);
        }
        if let Some(l) = &filters.language {
            query_builder = query_builder.bind(l);
        }
        if let Some(ct) = &filters.chunk_type {
            query_builder = query_builder.bind(ct);
        }
        let rows = query_builder
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(chunk_id, similarity)| VectorHit { chunk_id, similarity })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_code_domains_select_distinct_columns() {
        assert_eq!(VectorDomain::Text.column(), "embedding_text");
        assert_eq!(VectorDomain::Code.column(), "embedding_code");
    }

    #[test]
    fn default_filters_are_all_none() {
        let filters = VectorFilters::default();
        assert!(filters.repository.is_none());
        assert!(filters.language.is_none());
        assert!(filters.chunk_type.is_none());
    }
}
