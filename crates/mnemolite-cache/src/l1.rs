//! L1: in-process LRU over chunk lists, keyed by `file_path`, with
//! content-hash (zero-trust) validation.

use std::num::NonZeroUsize;

use lru::LruCache;
use mnemolite_core::CodeChunk;
use parking_lot::Mutex;
use serde::Serialize;

use crate::hash::content_hash;

const DEFAULT_CAPACITY_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    content_hash: String,
    chunks: Vec<CodeChunk>,
    byte_size: usize,
}

struct State {
    cache: LruCache<String, Entry>,
    current_bytes: usize,
    max_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Byte-bounded, content-hash-validated LRU. Embeddings are never counted
/// towards `byte_size` — callers are expected to populate the cache before
/// generating embeddings (the indexing pipeline does exactly this).
pub struct L1Cache {
    state: Mutex<State>,
}

#[derive(Debug, Clone, Serialize)]
pub struct L1Stats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size_mb: f64,
    pub utilization_percent: f64,
}

fn entry_byte_size(source: &str, chunks: &[CodeChunk]) -> usize {
    let chunks_bytes = chunks
        .iter()
        .map(|c| serde_json::to_vec(c).map(|v| v.len()).unwrap_or(0))
        .sum::<usize>();
    source.len() + chunks_bytes
}

/// Strips embeddings before storing — L1 never retains vectors.
fn without_embeddings(chunks: &[CodeChunk]) -> Vec<CodeChunk> {
    chunks
        .iter()
        .cloned()
        .map(|mut c| {
            c.embedding_text = None;
            c.embedding_code = None;
            c
        })
        .collect()
}

impl L1Cache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            state: Mutex::new(State {
                cache: LruCache::new(NonZeroUsize::new(DEFAULT_CAPACITY_ENTRIES).unwrap()),
                current_bytes: 0,
                max_bytes,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn put(&self, path: &str, source: &str, chunks: &[CodeChunk]) {
        let stored_chunks = without_embeddings(chunks);
        let byte_size = entry_byte_size(source, &stored_chunks);
        let mut state = self.state.lock();

        if let Some(old) = state.cache.peek(path) {
            state.current_bytes = state.current_bytes.saturating_sub(old.byte_size);
        }

        state.cache.put(
            path.to_string(),
            Entry {
                content_hash: content_hash(source),
                chunks: stored_chunks,
                byte_size,
            },
        );
        state.current_bytes += byte_size;

        while state.current_bytes > state.max_bytes {
            match state.cache.pop_lru() {
                Some((_, evicted)) => {
                    state.current_bytes = state.current_bytes.saturating_sub(evicted.byte_size);
                    state.evictions += 1;
                }
                None => break,
            }
        }
    }

    /// Returns the cached chunks iff the stored hash matches `md5(source)`.
    /// On mismatch the entry is evicted (zero-trust) and this reports a
    /// miss, matching a `put` of different content for the same path.
    pub fn get(&self, path: &str, source: &str) -> Option<Vec<CodeChunk>> {
        let expected = content_hash(source);
        let mut state = self.state.lock();

        let matches = state.cache.peek(path).map(|e| e.content_hash == expected);
        match matches {
            Some(true) => {
                state.hits += 1;
                state.cache.get(path).map(|e| e.chunks.clone())
            }
            Some(false) => {
                if let Some(evicted) = state.cache.pop(path) {
                    state.current_bytes = state.current_bytes.saturating_sub(evicted.byte_size);
                    state.evictions += 1;
                }
                state.misses += 1;
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    pub fn remove(&self, path: &str) {
        let mut state = self.state.lock();
        if let Some(evicted) = state.cache.pop(path) {
            state.current_bytes = state.current_bytes.saturating_sub(evicted.byte_size);
        }
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.current_bytes = 0;
    }

    pub fn stats(&self) -> L1Stats {
        let state = self.state.lock();
        L1Stats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            size_mb: state.current_bytes as f64 / (1024.0 * 1024.0),
            utilization_percent: if state.max_bytes == 0 {
                0.0
            } else {
                (state.current_bytes as f64 / state.max_bytes as f64) * 100.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemolite_core::{ChunkMetadata, ChunkType};
    use uuid::Uuid;

    fn sample_chunk() -> CodeChunk {
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
    fn put_then_get_is_a_hit() {
        let cache = L1Cache::new(1024 * 1024);
        cache.put("f.py", "v1", &[sample_chunk()]);
        let result = cache.get("f.py", "v1");
        assert!(result.is_some());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn hash_mismatch_is_a_miss_and_evicts() {
        let cache = L1Cache::new(1024 * 1024);
        cache.put("f.py", "v1", &[sample_chunk()]);
        let result = cache.get("f.py", "v2");
        assert!(result.is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert!(cache.get("f.py", "v1").is_none());
    }

    #[test]
    fn empty_chunks_put_get_round_trips() {
        let cache = L1Cache::new(1024 * 1024);
        cache.put("f.py", "v1", &[]);
        let result = cache.get("f.py", "v1").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn evicts_lru_entries_over_budget() {
        let cache = L1Cache::new(1); // effectively zero headroom
        cache.put("a.py", "aaaa", &[sample_chunk()]);
        cache.put("b.py", "bbbb", &[sample_chunk()]);
        assert!(cache.get("a.py", "aaaa").is_none());
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn embeddings_are_stripped_from_storage() {
        let cache = L1Cache::new(1024 * 1024);
        let mut chunk = sample_chunk();
        chunk.embedding_code = Some(vec![0.1; 768]);
        cache.put("f.py", "v1", &[chunk]);
        let stored = cache.get("f.py", "v1").unwrap();
        assert!(stored[0].embedding_code.is_none());
    }
}
