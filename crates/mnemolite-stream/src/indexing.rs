//! Indexing service (C6): orchestrates a single file end-to-end — cache
//! lookup, chunking, metadata extraction, embedding, qualified naming, and
//! the transactional per-file write.

use std::sync::Arc;

use mnemolite_cache::{content_hash, CascadingCache};
use mnemolite_core::{
    chunk as chunk_source, extract_metadata, generate_name_path, lsp_type_for_chunk_type,
    CodeChunk, CodeParser, ParentContext, SupportedLanguage,
};
use mnemolite_search::{Embedder, Role};
use mnemolite_storage::ChunkRepository;
use tracing::{info, warn};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub generate_embeddings: bool,
    pub max_chunk_size: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            generate_embeddings: true,
            max_chunk_size: mnemolite_core::DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexFileReport {
    pub chunks_written: usize,
    pub cache_hit: bool,
}

pub struct IndexingService {
    cache: Arc<CascadingCache>,
    embedder: Arc<Embedder>,
    chunks: Arc<ChunkRepository>,
}

impl IndexingService {
    pub fn new(cache: Arc<CascadingCache>, embedder: Arc<Embedder>, chunks: Arc<ChunkRepository>) -> Self {
        Self { cache, embedder, chunks }
    }

    /// Runs the five-step orchestration in spec.md §4.5: cache lookup (or
    /// chunk + extract on miss), optional dual embedding, qualified naming,
    /// and one transactional per-file rewrite.
    pub async fn index_file(
        &self,
        repository: &str,
        file_path: &str,
        content: &str,
        language: SupportedLanguage,
        opts: &IndexOptions,
    ) -> Result<IndexFileReport> {
        let (mut chunks, cache_hit) = match self.cache.get(file_path, content).await {
            Some(cached) => (cached, true),
            None => {
                let mut fresh = chunk_source(content, language, repository, file_path, opts.max_chunk_size)
                    .map_err(|e| crate::error::StreamError::Chunking {
                        file_path: file_path.to_string(),
                        source: e,
                    })?;
                annotate_metadata(&mut fresh, content, language);
                self.cache.put(file_path, content, &fresh).await;
                (fresh, false)
            }
        };

        assign_name_paths(&mut chunks, file_path, language);

        if opts.generate_embeddings {
            self.embed_chunks(&mut chunks).await?;
        }

        for chunk in &mut chunks {
            chunk.metadata.content_hash = Some(content_hash(content));
        }

        self.chunks.rewrite_file(repository, file_path, &chunks).await?;

        info!(repository, file_path, chunks = chunks.len(), cache_hit, "indexed file");

        Ok(IndexFileReport { chunks_written: chunks.len(), cache_hit })
    }

    async fn embed_chunks(&self, chunks: &mut [CodeChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let text_inputs: Vec<String> = chunks.iter().map(embedding_text_input).collect();
        let code_inputs: Vec<String> = chunks.iter().map(|c| c.source_code.clone()).collect();

        let text_vectors = self.embedder.embed_text(text_inputs, Role::Passage).await?;
        let code_vectors = self.embedder.embed_code(code_inputs).await?;

        for ((chunk, text_vec), code_vec) in chunks.iter_mut().zip(text_vectors).zip(code_vectors) {
            chunk.embedding_text = Some(text_vec);
            chunk.embedding_code = Some(code_vec);
        }
        Ok(())
    }
}

/// TEXT-domain input: docstring when present, falling back to the
/// name/name_path so untyped chunks still get a meaningful semantic vector.
fn embedding_text_input(chunk: &CodeChunk) -> String {
    chunk
        .metadata
        .docstring
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| chunk.name_path.clone())
}

/// Re-parses each chunk's own source in isolation and extracts metadata from
/// its root. This loses cross-chunk context (e.g. imports declared
/// elsewhere in the file) but gives every chunk an accurate `calls`,
/// `complexity`, and `signature` without retaining the whole-file AST past
/// the chunking pass.
fn annotate_metadata(chunks: &mut [CodeChunk], _file_content: &str, language: SupportedLanguage) {
    for chunk in chunks.iter_mut() {
        let Ok(mut parser) = CodeParser::new(language) else { continue };
        let Ok(tree) = parser.parse(&chunk.source_code) else { continue };
        let mut metadata = extract_metadata(tree.root_node(), &chunk.source_code, language);
        metadata.lsp_type = Some(lsp_type_for_chunk_type(chunk.chunk_type));
        chunk.metadata = metadata;
    }
}

/// Computes each chunk's fully qualified `name_path`, using the file's
/// Class/Interface chunks as parent context for any chunk their line range
/// contains.
fn assign_name_paths(chunks: &mut [CodeChunk], file_path: &str, language: SupportedLanguage) {
    let containers: Vec<ParentContext> = chunks
        .iter()
        .filter(|c| matches!(c.chunk_type, mnemolite_core::ChunkType::Class | mnemolite_core::ChunkType::Interface))
        .map(|c| ParentContext {
            name: c.name.clone(),
            start_line: c.start_line,
            end_line: c.end_line,
        })
        .collect();

    for chunk in chunks.iter_mut() {
        let parents: Vec<ParentContext> = containers
            .iter()
            .filter(|p| {
                p.start_line <= chunk.start_line
                    && p.end_line >= chunk.end_line
                    && !(p.start_line == chunk.start_line && p.end_line == chunk.end_line)
            })
            .cloned()
            .collect();

        if mnemolite_core::parents_overlap_without_nesting(&parents) {
            warn!(file_path, chunk = chunk.name, "overlapping, non-nested parent containers");
        }

        chunk.name_path = generate_name_path(&chunk.name, file_path, language, &parents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_core::{ChunkMetadata, ChunkType};
    use uuid::Uuid;

    fn sample_chunk(chunk_type: ChunkType, name: &str, start: u32, end: u32) -> CodeChunk {
        let now = Utc::now();
        CodeChunk {
            id: Uuid::new_v4(),
            repository: "R".into(),
            file_path: "api/services/search.py".into(),
            language: "python".into(),
            chunk_type,
            name: name.into(),
            name_path: name.into(),
            source_code: "pass".into(),
            start_line: start,
            end_line: end,
            embedding_text: None,
            embedding_code: None,
            metadata: ChunkMetadata::default(),
            commit_hash: None,
            indexed_at: now,
            last_modified: now,
        }
    }

    #[test]
    fn method_inside_class_gets_qualified_name_path() {
        let mut chunks = vec![
            sample_chunk(ChunkType::Class, "Searcher", 1, 100),
            sample_chunk(ChunkType::Method, "search", 10, 20),
        ];
        assign_name_paths(&mut chunks, "api/services/search.py", SupportedLanguage::Python);
        assert_eq!(chunks[1].name_path, "services.search.Searcher.search");
    }

    #[test]
    fn top_level_function_has_no_parent_segment() {
        let mut chunks = vec![sample_chunk(ChunkType::Function, "helper", 1, 5)];
        assign_name_paths(&mut chunks, "api/services/search.py", SupportedLanguage::Python);
        assert_eq!(chunks[0].name_path, "services.search.helper");
    }

    #[test]
    fn embedding_text_input_falls_back_to_name_path_without_docstring() {
        let chunk = sample_chunk(ChunkType::Function, "helper", 1, 5);
        assert_eq!(embedding_text_input(&chunk), "helper");
    }
}
