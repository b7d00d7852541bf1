//! Subprocess entry point for one indexing batch (C8). Spawned by the
//! consumer once per batch, in its own process so a panic or OOM in model
//! inference can never take the consumer loop down with it. Prints its
//! [`WorkerResult`] as the last line of stdout and nothing after.

use std::sync::Arc;

use clap::Parser;
use mnemolite_cache::{CascadingCache, L1Cache, L2Cache};
use mnemolite_config::MnemoliteConfig;
use mnemolite_search::{Embedder, LocalProvider};
use mnemolite_storage::{ChunkRepository, ErrorRepository};
use mnemolite_stream::indexing::IndexingService;
use mnemolite_stream::worker;

#[derive(Parser, Debug)]
#[command(name = "mnemolite-batch-worker")]
struct Args {
    #[arg(long)]
    repository: String,

    #[arg(long)]
    database_url: String,

    /// Comma-separated file paths.
    #[arg(long)]
    files: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();
    let config = MnemoliteConfig::load()?;

    let pool = mnemolite_storage::connect(&args.database_url).await?;
    let chunks = ChunkRepository::new(pool.clone());
    let errors = ErrorRepository::new(pool);

    let l1 = L1Cache::new(config.cache_l1_max_mb * 1024 * 1024);
    let l2 = L2Cache::new(config.cache_l2_url.as_deref(), 86_400, "mnemolite:chunks");
    let cache = Arc::new(CascadingCache::new(l1, l2));

    let provider = Arc::new(LocalProvider::new()?);
    let embedder = Arc::new(Embedder::new(provider));

    let indexing = IndexingService::new(cache, embedder, Arc::new(chunks));

    let files: Vec<String> = args.files.split(',').map(|s| s.to_string()).filter(|s| !s.is_empty()).collect();

    let result = worker::run_batch(&indexing, &errors, &args.repository, &files).await;

    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
