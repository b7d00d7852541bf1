//! One-shot backfill for entries persisted before the hash-validation rule
//! was introduced: recompute MD5 of `source_code`, stamp it into
//! `metadata.content_hash`, and hand back the updated chunk. Out-of-band —
//! callers decide when to run it; nothing here blocks start-up.

use mnemolite_core::CodeChunk;

use crate::hash::content_hash;

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct BackfillReport {
    pub scanned: usize,
    pub backfilled: usize,
    pub already_hashed: usize,
}

/// Stamps `metadata.content_hash` on every chunk lacking one. Chunks that
/// already carry a hash are left untouched (idempotent — safe to re-run).
pub fn backfill_content_hashes(chunks: &mut [CodeChunk]) -> BackfillReport {
    let mut report = BackfillReport::default();
    for chunk in chunks.iter_mut() {
        report.scanned += 1;
        if chunk.metadata.content_hash.is_some() {
            report.already_hashed += 1;
            continue;
        }
        chunk.metadata.content_hash = Some(content_hash(&chunk.source_code));
        report.backfilled += 1;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_core::{ChunkMetadata, ChunkType};
    use uuid::Uuid;

    fn chunk_without_hash() -> CodeChunk {
        let now = Utc::now();
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "R1".into(),
            file_path: "f.py".into(),
            language: "python".into(),
            chunk_type: ChunkType::Function,
            name: "add".into(),
            name_path: "f.add".into(),
            source_code: "def add(a,b): return a+b".into(),
            start_line: 1,
            end_line: 1,
            embedding_text: None,
            embedding_code: None,
            metadata: ChunkMetadata::default(),
            commit_hash: None,
            indexed_at: now,
            last_modified: now,
        }
    }

    #[test]
    fn backfills_missing_hash() {
        let mut chunks = vec![chunk_without_hash()];
        let report = backfill_content_hashes(&mut chunks);
        assert_eq!(report.backfilled, 1);
        let hash = chunks[0].metadata.content_hash.as_ref().unwrap();
        assert_eq!(hash.len(), 32);
    }

    #[test]
    fn is_idempotent() {
        let mut chunks = vec![chunk_without_hash()];
        backfill_content_hashes(&mut chunks);
        let report = backfill_content_hashes(&mut chunks);
        assert_eq!(report.backfilled, 0);
        assert_eq!(report.already_hashed, 1);
    }
}
