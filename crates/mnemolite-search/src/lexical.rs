//! Lexical search (C10): trigram similarity over `(source_code, name,
//! name_path)` via `pg_trgm`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

const DEFAULT_MIN_SIMILARITY: f32 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct LexicalFilters {
    pub repository: Option<String>,
    pub language: Option<String>,
    pub chunk_type: Option<String>,
    pub file_path_contains: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub chunk_id: Uuid,
    pub similarity: f32,
}

pub struct LexicalSearcher {
    pool: PgPool,
    min_similarity: f32,
}

impl LexicalSearcher {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Scores via `GREATEST(similarity(...))` across the three trigram
    /// fields, filters by the optional facets, and returns rank-ordered hits
    /// with the raw similarity scalar.
    pub async fn search(
        &self,
        query: &str,
        filters: &LexicalFilters,
        limit: usize,
    ) -> Result<Vec<LexicalHit>> {
        let mut sql = String::from(
            "SELECT id, GREATEST(
                 similarity(source_code, $1),
                 similarity(name, $1),
                 similarity(name_path, $1)
             ) AS sim
             FROM code_chunks
             WHERE GREATEST(
                 similarity(source_code, $1),
                 similarity(name, $1),
                 similarity(name_path, $1)
             ) >= $2",
        );
        let mut bind_idx = 3;
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
        if filters.file_path_contains.is_some() {
            sql.push_str(&format!(" AND file_path LIKE ${bind_idx}"));
            bind_idx += 1;
        }
        sql.push_str(&format!(" ORDER BY sim DESC LIMIT ${bind_idx}"));

        let mut query_builder = sqlx::query_as::<_, (Uuid, f32)>(&sql)
            .bind(query)
            .bind(self.min_similarity);
        if let Some(r) = &filters.repository {
            query_builder = query_builder.bind(r);
        }
        if let Some(l) = &filters.language {
            query_builder = query_builder.bind(l);
        }
        if let Some(ct) = &filters.chunk_type {
            query_builder = query_builder.bind(ct);
        }
        if let Some(fp) = &filters.file_path_contains {
            query_builder = query_builder.bind(format!("%{fp}%"));
        }
        let rows = query_builder.bind(limit as i64).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(chunk_id, similarity)| LexicalHit { chunk_id, similarity })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_min_similarity_favors_recall() {
        assert_eq!(DEFAULT_MIN_SIMILARITY, 0.1);
    }

    #[test]
    fn default_filters_are_all_none() {
        let filters = LexicalFilters::default();
        assert!(filters.repository.is_none());
        assert!(filters.language.is_none());
        assert!(filters.chunk_type.is_none());
        assert!(filters.file_path_contains.is_none());
    }
}
