//! Batch worker logic: processes one batch of files against the indexing
//! service, isolating each file's failure from the rest of the batch.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use mnemolite_core::SupportedLanguage;
use mnemolite_storage::{ErrorRepository, IndexingError, IndexingErrorType};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::indexing::{IndexOptions, IndexingService};

/// Files at or above this size are rejected before chunking (spec invariant
/// 10) rather than handed to the parser.
const MAX_FILE_SIZE_BYTES: u64 = 10_000_000;

/// The shape a subprocess worker prints as its last stdout line, per the
/// batch-processing contract the consumer parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerResult {
    pub success_count: u64,
    pub error_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Processes every file in `batch`, recording isolated per-file failures in
/// the error repository and continuing with the rest of the batch.
pub async fn run_batch(
    indexing: &IndexingService,
    errors: &ErrorRepository,
    repository: &str,
    batch: &[String],
) -> WorkerResult {
    let mut result = WorkerResult::default();

    for file_path in batch {
        match process_one(indexing, repository, file_path).await {
            Ok(()) => result.success_count += 1,
            Err((error_type, message)) => {
                result.error_count += 1;
                result.errors.push(format!("{file_path}: {message}"));
                warn!(repository, file_path, %message, "file indexing failed");

                let record = errors
                    .record(&IndexingError {
                        repository: repository.to_string(),
                        file_path: file_path.clone(),
                        error_type,
                        error_message: message,
                        trace: None,
                        language: SupportedLanguage::from_path(Path::new(file_path)).map(|l| l.as_str().to_string()),
                        occurred_at: Utc::now(),
                    })
                    .await;
                if let Err(e) = record {
                    warn!(repository, file_path, error = %e, "failed to record indexing error");
                }
            }
        }
    }

    result
}

async fn process_one(
    indexing: &IndexingService,
    repository: &str,
    file_path: &str,
) -> Result<(), (IndexingErrorType, String)> {
    let language = SupportedLanguage::from_path(Path::new(file_path))
        .ok_or_else(|| (IndexingErrorType::ParsingError, "unsupported file extension".to_string()))?;

    let size = tokio::fs::metadata(file_path)
        .await
        .map_err(|e| (IndexingErrorType::PersistenceError, format!("stat failed: {e}")))?
        .len();
    check_file_size(size)?;

    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|e| classify_read_error(&e))?;

    indexing
        .index_file(repository, file_path, &content, language, &IndexOptions::default())
        .await
        .map(|_| ())
        .map_err(|e| (classify(&e), e.to_string()))
}

/// Rejects files at or above [`MAX_FILE_SIZE_BYTES`] before they ever reach
/// the parser (spec invariant 10).
fn check_file_size(size: u64) -> Result<(), (IndexingErrorType, String)> {
    if size >= MAX_FILE_SIZE_BYTES {
        Err((
            IndexingErrorType::ValidationError,
            format!("file size {size} bytes exceeds the {MAX_FILE_SIZE_BYTES}-byte indexing limit"),
        ))
    } else {
        Ok(())
    }
}

/// Non-UTF-8 content surfaces from `read_to_string` as `InvalidData`;
/// anything else is a genuine I/O failure.
fn classify_read_error(e: &std::io::Error) -> (IndexingErrorType, String) {
    if e.kind() == std::io::ErrorKind::InvalidData {
        (IndexingErrorType::EncodingError, format!("invalid utf-8: {e}"))
    } else {
        (IndexingErrorType::PersistenceError, format!("read failed: {e}"))
    }
}

fn classify(err: &crate::error::StreamError) -> IndexingErrorType {
    match err {
        crate::error::StreamError::Chunking { .. } => IndexingErrorType::ChunkingError,
        crate::error::StreamError::Search(_) => IndexingErrorType::EmbeddingError,
        crate::error::StreamError::Storage(_) => IndexingErrorType::PersistenceError,
        _ => IndexingErrorType::ParsingError,
    }
}

pub struct BatchContext {
    pub indexing: Arc<IndexingService>,
    pub errors: Arc<ErrorRepository>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_result_serializes_without_empty_errors_array() {
        let result = WorkerResult { success_count: 3, error_count: 0, errors: vec![] };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"success_count":3,"error_count":0}"#);
    }

    #[test]
    fn worker_result_includes_errors_when_present() {
        let result = WorkerResult { success_count: 1, error_count: 1, errors: vec!["a.py: boom".into()] };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"errors\":[\"a.py: boom\"]"));
    }

    #[test]
    fn files_under_the_size_limit_pass() {
        assert!(check_file_size(MAX_FILE_SIZE_BYTES - 1).is_ok());
    }

    #[test]
    fn files_at_or_over_the_size_limit_are_rejected_as_validation_errors() {
        let (error_type, _) = check_file_size(MAX_FILE_SIZE_BYTES).unwrap_err();
        assert_eq!(error_type, IndexingErrorType::ValidationError);

        let (error_type, _) = check_file_size(MAX_FILE_SIZE_BYTES + 1).unwrap_err();
        assert_eq!(error_type, IndexingErrorType::ValidationError);
    }

    #[test]
    fn invalid_utf8_classifies_as_encoding_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8");
        let (error_type, message) = classify_read_error(&io_err);
        assert_eq!(error_type, IndexingErrorType::EncodingError);
        assert!(message.contains("invalid utf-8"));
    }

    #[test]
    fn other_io_failures_classify_as_persistence_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let (error_type, _) = classify_read_error(&io_err);
        assert_eq!(error_type, IndexingErrorType::PersistenceError);
    }
}
