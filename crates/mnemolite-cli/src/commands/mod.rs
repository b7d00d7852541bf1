//! CLI command implementations.

pub mod consume;
pub mod graph_build;
pub mod mcp;
pub mod produce;
pub mod search;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use mnemolite_config::MnemoliteConfig;
use mnemolite_search::{CrossEncoderReranker, Embedder, HybridSearcher, LexicalSearcher, LocalProvider};
use mnemolite_storage::{ChunkRepository, VectorSearcher};
use sqlx::PgPool;

use crate::GlobalOptions;

/// Loads `MnemoliteConfig` and applies `--database-url`/`--redis-url` overrides.
pub fn load_config(global: &GlobalOptions) -> Result<MnemoliteConfig> {
    let mut config = MnemoliteConfig::load().context("invalid configuration")?;
    if let Some(ref url) = global.database_url {
        config.database_url = url.clone();
    }
    Ok(config)
}

pub async fn connect_storage(config: &MnemoliteConfig) -> Result<PgPool> {
    mnemolite_storage::connect(&config.database_url)
        .await
        .context("failed to connect to storage")
}

pub fn redis_client(global: &GlobalOptions, config: &MnemoliteConfig) -> Result<redis::Client> {
    let url = global
        .redis_url
        .clone()
        .or_else(|| config.cache_l2_url.clone())
        .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
    redis::Client::open(url).context("failed to build redis client")
}

/// Builds the hybrid searcher stack shared by the `search` command and the
/// MCP server: local embedding provider, lexical + vector legs over the same
/// pool, and a cross-encoder reranker when `RERANK_MODEL` is configured.
pub fn build_searcher(pool: PgPool, config: &MnemoliteConfig) -> Result<HybridSearcher> {
    let provider = LocalProvider::new().context("failed to load local embedding provider")?;
    let embedder = Embedder::new(Arc::new(provider));
    let lexical = LexicalSearcher::new(pool.clone());
    let vector = VectorSearcher::new(pool.clone());
    let chunks = ChunkRepository::new(pool);

    let mut searcher = HybridSearcher::new(embedder, lexical, vector, chunks);
    if let Some(ref model_id) = config.rerank_model {
        searcher = searcher.with_reranker(CrossEncoderReranker::new(model_id.clone()));
    }
    Ok(searcher)
}

/// Prints to stderr unless `quiet` is set.
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

pub fn print_error(message: &str) {
    eprintln!("error: {message}");
}
