//! `code_chunks` repository: per-file rewrite and lookups.

use chrono::{DateTime, Utc};
use mnemolite_core::{ChunkMetadata, ChunkType, CodeChunk};
use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StorageError;

pub struct ChunkRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ChunkRow {
    id: Uuid,
    repository: String,
    file_path: String,
    language: String,
    chunk_type: String,
    name: String,
    name_path: String,
    source_code: String,
    start_line: i32,
    end_line: i32,
    embedding_text: Option<Vector>,
    embedding_code: Option<Vector>,
    metadata: serde_json::Value,
    commit_hash: Option<String>,
    indexed_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

fn chunk_type_from_str(s: &str) -> ChunkType {
    match s {
        "FUNCTION" => ChunkType::Function,
        "METHOD" => ChunkType::Method,
        "CLASS" => ChunkType::Class,
        "INTERFACE" => ChunkType::Interface,
        "MODULE" => ChunkType::Module,
        _ => ChunkType::FallbackFixed,
    }
}

impl TryFrom<ChunkRow> for CodeChunk {
    type Error = StorageError;

    fn try_from(row: ChunkRow) -> Result<Self, Self::Error> {
        let metadata: ChunkMetadata = serde_json::from_value(row.metadata)?;
        Ok(CodeChunk {
            id: row.id,
            repository: row.repository,
            file_path: row.file_path,
            language: row.language,
            chunk_type: chunk_type_from_str(&row.chunk_type),
            name: row.name,
            name_path: row.name_path,
            source_code: row.source_code,
            start_line: row.start_line as u32,
            end_line: row.end_line as u32,
            embedding_text: row.embedding_text.map(|v| v.to_vec()),
            embedding_code: row.embedding_code.map(|v| v.to_vec()),
            metadata,
            commit_hash: row.commit_hash,
            indexed_at: row.indexed_at,
            last_modified: row.last_modified,
        })
    }
}

impl ChunkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Per-file rewrite: deletes every chunk for `(repository, file_path)`
    /// and inserts `chunks` in its place, inside one transaction — readers
    /// never observe a partial file.
    pub async fn rewrite_file(
        &self,
        repository: &str,
        file_path: &str,
        chunks: &[CodeChunk],
    ) -> Result<(), StorageError> {
        for chunk in chunks {
            chunk
                .validate()
                .map_err(StorageError::InvalidChunk)?;
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM code_chunks WHERE repository = $1 AND file_path = $2")
            .bind(repository)
            .bind(file_path)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            let embedding_text = chunk.embedding_text.clone().map(Vector::from);
            let embedding_code = chunk.embedding_code.clone().map(Vector::from);
            let metadata = serde_json::to_value(&chunk.metadata)?;

            sqlx::query(
                "INSERT INTO code_chunks
                 (id, repository, file_path, language, chunk_type, name, name_path,
                  source_code, start_line, end_line, embedding_text, embedding_code,
                  metadata, commit_hash, indexed_at, last_modified)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)",
            )
            .bind(chunk.id)
            .bind(&chunk.repository)
            .bind(&chunk.file_path)
            .bind(&chunk.language)
            .bind(chunk.chunk_type.as_str())
            .bind(&chunk.name)
            .bind(&chunk.name_path)
            .bind(&chunk.source_code)
            .bind(chunk.start_line as i32)
            .bind(chunk.end_line as i32)
            .bind(embedding_text)
            .bind(embedding_code)
            .bind(metadata)
            .bind(&chunk.commit_hash)
            .bind(chunk.indexed_at)
            .bind(chunk.last_modified)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_repository(&self, repository: &str) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM code_chunks WHERE repository = $1")
            .bind(repository)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_by_repository(&self, repository: &str) -> Result<Vec<CodeChunk>, StorageError> {
        let rows: Vec<ChunkRow> = sqlx::query_as(
            "SELECT id, repository, file_path, language, chunk_type, name, name_path,
                    source_code, start_line, end_line, embedding_text, embedding_code,
                    metadata, commit_hash, indexed_at, last_modified
             FROM code_chunks WHERE repository = $1 ORDER BY file_path, start_line",
        )
        .bind(repository)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CodeChunk::try_from).collect()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<CodeChunk>, StorageError> {
        let row: Option<ChunkRow> = sqlx::query_as(
            "SELECT id, repository, file_path, language, chunk_type, name, name_path,
                    source_code, start_line, end_line, embedding_text, embedding_code,
                    metadata, commit_hash, indexed_at, last_modified
             FROM code_chunks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CodeChunk::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_type_round_trips_through_as_str() {
        for ct in [
            ChunkType::Function,
            ChunkType::Method,
            ChunkType::Class,
            ChunkType::Interface,
            ChunkType::Module,
        ] {
            assert_eq!(chunk_type_from_str(ct.as_str()), ct);
        }
    }

    #[test]
    fn unknown_chunk_type_falls_back_to_fallback_fixed() {
        assert_eq!(chunk_type_from_str("garbage"), ChunkType::FallbackFixed);
    }
}
