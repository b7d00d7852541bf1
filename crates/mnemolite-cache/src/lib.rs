//! Cascading content-addressed cache (C2): an in-process L1 LRU in front of
//! an optional distributed L2 (Redis). Both layers validate by content hash
//! rather than trusting mtimes — a stale hit is structurally impossible.

pub mod error;
pub mod hash;
pub mod l1;
pub mod l2;
pub mod migrate;

pub use error::CacheError;
pub use hash::{content_hash, is_valid_hash};
pub use l1::{L1Cache, L1Stats};
pub use l2::{L2Cache, L2Stats};

use mnemolite_core::CodeChunk;
use serde::Serialize;

pub struct CascadingCache {
    l1: L1Cache,
    l2: L2Cache,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub l1: L1Stats,
    pub l2: L2Stats,
    pub combined_hit_rate: f64,
}

impl CascadingCache {
    pub fn new(l1: L1Cache, l2: L2Cache) -> Self {
        Self { l1, l2 }
    }

    /// L1 first; on an L1 miss, falls through to L2 and promotes the result
    /// back into L1 so the next lookup for this path is satisfied locally.
    pub async fn get(&self, path: &str, source: &str) -> Option<Vec<CodeChunk>> {
        if let Some(chunks) = self.l1.get(path, source) {
            return Some(chunks);
        }
        let chunks = self.l2.get(path, source).await?;
        self.l1.put(path, source, &chunks);
        Some(chunks)
    }

    /// Write-through: both layers receive the new entry immediately.
    pub async fn put(&self, path: &str, source: &str, chunks: &[CodeChunk]) {
        self.l1.put(path, source, chunks);
        self.l2.put(path, source, chunks).await;
    }

    pub async fn remove(&self, path: &str) {
        self.l1.remove(path);
        self.l2.remove(path).await;
    }

    pub fn clear_l1(&self) {
        self.l1.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let l1 = self.l1.stats();
        let l2 = self.l2.stats();
        let total_hits = l1.hits + l2.hits;
        let total_lookups = total_hits + l2.misses;
        let combined_hit_rate = if total_lookups == 0 {
            0.0
        } else {
            total_hits as f64 / total_lookups as f64
        };
        CacheStats { l1, l2, combined_hit_rate }
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

    #[tokio::test]
    async fn get_falls_through_to_degraded_l2_as_miss() {
        let cache = CascadingCache::new(L1Cache::new(1024 * 1024), L2Cache::new(None, 3600, "mnemolite"));
        assert!(cache.get("f.py", "src").await.is_none());
    }

    #[tokio::test]
    async fn put_then_get_hits_l1_without_touching_l2() {
        let cache = CascadingCache::new(L1Cache::new(1024 * 1024), L2Cache::new(None, 3600, "mnemolite"));
        cache.put("f.py", "src", &[sample_chunk()]).await;
        let result = cache.get("f.py", "src").await;
        assert!(result.is_some());
        assert_eq!(cache.stats().l1.hits, 1);
    }

    #[tokio::test]
    async fn degraded_l2_reports_disconnected() {
        let cache = CascadingCache::new(L1Cache::new(1024 * 1024), L2Cache::new(None, 3600, "mnemolite"));
        assert!(!cache.stats().l2.connected);
    }
}
