//! L2: distributed cache over Redis. Degrades gracefully — any connection
//! failure is logged and reported as a miss, never propagated to the caller.

use std::sync::atomic::{AtomicU64, Ordering};

use mnemolite_core::CodeChunk;
use redis::AsyncCommands;
use tracing::warn;

use crate::hash::content_hash;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoredEntry {
    content_hash: String,
    chunks: Vec<CodeChunk>,
}

pub struct L2Cache {
    client: Option<redis::Client>,
    ttl_seconds: u64,
    key_prefix: String,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct L2Stats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub connected: bool,
}

impl L2Cache {
    /// `redis_url` of `None` yields a permanently-disconnected L2 — every
    /// operation is a no-op miss. This is the degraded-mode entry point used
    /// when no Redis endpoint is configured.
    pub fn new(redis_url: Option<&str>, ttl_seconds: u64, key_prefix: impl Into<String>) -> Self {
        let client = redis_url.and_then(|url| match redis::Client::open(url) {
            Ok(c) => Some(c),
            Err(err) => {
                warn!(error = %err, "L2 cache: failed to build redis client, running degraded");
                None
            }
        });
        Self {
            client,
            ttl_seconds,
            key_prefix: key_prefix.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn stats(&self) -> L2Stats {
        L2Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            connected: self.is_connected(),
        }
    }

    fn key(&self, path: &str) -> String {
        format!("{}:{}", self.key_prefix, path)
    }

    pub async fn get(&self, path: &str, source: &str) -> Option<Vec<CodeChunk>> {
        let client = self.client.as_ref()?;
        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(err) => {
                warn!(error = %err, "L2 cache: connection failed, treating as miss");
                self.errors.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let raw: Option<String> = match conn.get(self.key(path)).await {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "L2 cache: GET failed, treating as miss");
                self.errors.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let Some(raw) = raw else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let entry: StoredEntry = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "L2 cache: deserialization failed, treating as miss");
                self.errors.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if entry.content_hash != content_hash(source) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.chunks)
    }

    pub async fn put(&self, path: &str, source: &str, chunks: &[CodeChunk]) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(err) => {
                warn!(error = %err, "L2 cache: connection failed on PUT, skipping");
                self.errors.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let entry = StoredEntry {
            content_hash: content_hash(source),
            chunks: chunks.to_vec(),
        };
        let Ok(payload) = serde_json::to_string(&entry) else {
            return;
        };

        if let Err(err) = conn
            .set_ex::<_, _, ()>(self.key(path), payload, self.ttl_seconds)
            .await
        {
            warn!(error = %err, "L2 cache: SET failed");
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub async fn remove(&self, path: &str) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
            let _: Result<u64, _> = conn.del(self.key(path)).await;
        }
    }
}
