//! Status command - show a repository's batch indexing job status.

use anyhow::{Context, Result};
use clap::Args;
use mnemolite_stream::StatusRepository;

use super::{load_config, redis_client};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Repository to check
    repository: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: StatusArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let client = redis_client(&global, &config)?;
    let status_repo = StatusRepository::new(client);

    let status = status_repo
        .get(&args.repository)
        .await
        .context("failed to read indexing status")?;

    let Some(status) = status else {
        if args.json {
            println!("{}", serde_json::json!({ "repository": args.repository, "status": "not_found" }));
        } else if !global.quiet {
            println!("No indexing job found for repository '{}'.", args.repository);
        }
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Indexing status: {}", args.repository);
    println!("=================");
    println!("Job:        {}", status.job_id);
    println!("Status:     {:?}", status.status);
    println!("Progress:   {}/{} files ({} failed)", status.processed_files, status.total_files, status.failed_files);
    println!("Batch:      {}/{}", status.current_batch, status.total_batches);
    println!("Started:    {}", status.started_at);
    if let Some(completed_at) = status.completed_at {
        println!("Completed:  {completed_at}");
    }

    Ok(())
}
