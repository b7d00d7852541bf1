//! Graph-build command - manually rebuilds a repository's call/containment
//! graph from its currently-indexed chunks (normally triggered automatically
//! by the consumer after a job's last batch completes).

use anyhow::{Context, Result};
use clap::Args;
use mnemolite_stream::GraphTrigger;

use super::{connect_storage, load_config, print_info};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct GraphBuildArgs {
    /// Repository to rebuild the graph for
    repository: String,
}

pub async fn execute(args: GraphBuildArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let pool = connect_storage(&config).await?;
    let chunks = mnemolite_storage::ChunkRepository::new(pool.clone());
    let graph_repo = mnemolite_storage::GraphRepository::new(pool.clone());
    let metrics_repo = mnemolite_storage::MetricsRepository::new(pool);
    let trigger = GraphTrigger::new(chunks, graph_repo, metrics_repo);

    print_info(&format!("rebuilding graph for {}...", args.repository), global.quiet);

    trigger
        .rebuild(&args.repository)
        .await
        .context("graph rebuild failed")?;

    if !global.quiet {
        println!("Graph rebuilt for {}", args.repository);
    }

    Ok(())
}
