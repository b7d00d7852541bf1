//! `indexing_errors`: file-level failure log with a closed `error_type`
//! enumeration validated at ingress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingErrorType {
    ParsingError,
    EncodingError,
    ChunkingError,
    EmbeddingError,
    PersistenceError,
    ValidationError,
}

impl IndexingErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingErrorType::ParsingError => "parsing_error",
            IndexingErrorType::EncodingError => "encoding_error",
            IndexingErrorType::ChunkingError => "chunking_error",
            IndexingErrorType::EmbeddingError => "embedding_error",
            IndexingErrorType::PersistenceError => "persistence_error",
            IndexingErrorType::ValidationError => "validation_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexingError {
    pub repository: String,
    pub file_path: String,
    pub error_type: IndexingErrorType,
    pub error_message: String,
    pub trace: Option<String>,
    pub language: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

pub struct ErrorRepository {
    pool: PgPool,
}

impl ErrorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, error: &IndexingError) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO indexing_errors
             (id, repository, file_path, error_type, error_message, trace, language, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(&error.repository)
        .bind(&error.file_path)
        .bind(error.error_type.as_str())
        .bind(&error.error_message)
        .bind(&error.trace)
        .bind(&error.language)
        .bind(error.occurred_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn for_repository(&self, repository: &str) -> Result<Vec<IndexingError>, StorageError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            repository: String,
            file_path: String,
            error_type: String,
            error_message: String,
            trace: Option<String>,
            language: Option<String>,
            occurred_at: DateTime<Utc>,
        }

        let rows: Vec<Row> = sqlx::query_as(
            "SELECT repository, file_path, error_type, error_message, trace, language, occurred_at
             FROM indexing_errors WHERE repository = $1 ORDER BY occurred_at DESC",
        )
        .bind(repository)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| IndexingError {
                repository: r.repository,
                file_path: r.file_path,
                error_type: match r.error_type.as_str() {
                    "encoding_error" => IndexingErrorType::EncodingError,
                    "chunking_error" => IndexingErrorType::ChunkingError,
                    "embedding_error" => IndexingErrorType::EmbeddingError,
                    "persistence_error" => IndexingErrorType::PersistenceError,
                    "validation_error" => IndexingErrorType::ValidationError,
                    _ => IndexingErrorType::ParsingError,
                },
                error_message: r.error_message,
                trace: r.trace,
                language: r.language,
                occurred_at: r.occurred_at,
            })
            .collect())
    }
}
