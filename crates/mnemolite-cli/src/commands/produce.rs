//! Produce command - scan a repository tree and enqueue batch indexing jobs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mnemolite_stream::{BatchProducer, ScanOptions};

use super::{load_config, redis_client};
use crate::progress::{finish_spinner, spinner};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct ProduceArgs {
    /// Root directory to scan
    root: PathBuf,

    /// Repository identifier to tag the job with
    #[arg(long)]
    repository: String,

    /// Number of files per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Include test files (*.spec.*, *.test.*)
    #[arg(long)]
    include_tests: bool,
}

pub async fn execute(args: ProduceArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let client = redis_client(&global, &config)?;
    let producer = BatchProducer::new(client);

    let mut options = ScanOptions {
        include_tests: args.include_tests || config.include_tests,
        ..ScanOptions::default()
    };
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    } else {
        options.batch_size = config.batch_size;
    }

    let pb = spinner(&format!("scanning {}...", args.root.display()), global.quiet);

    let report = producer
        .scan_and_enqueue(&args.root, &args.repository, &options)
        .await
        .context("failed to enqueue indexing job")?;

    finish_spinner(pb, &format!("enqueued {} batches", report.total_batches));

    if global.quiet {
        println!("{}", serde_json::json!({
            "job_id": report.job_id,
            "total_files": report.total_files,
            "total_batches": report.total_batches,
        }));
    } else {
        println!("Enqueued job {}", report.job_id);
        println!("  files:   {}", report.total_files);
        println!("  batches: {}", report.total_batches);
    }

    Ok(())
}
