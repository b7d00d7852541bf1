//! Consume command - runs the batch indexing consumer daemon for a repository.
//!
//! Exit codes (spec §6): 0 on clean completion, 130 on SIGINT, 1 on fatal
//! error. SIGINT/SIGTERM both set the shared stop flag; the in-flight batch
//! finishes before the loop exits.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use mnemolite_stream::{consumer::shutdown_flag, BatchConsumer, ConsumerOptions, GraphTrigger};
use tokio::signal;
use tracing::{error, info};

use super::{connect_storage, load_config, redis_client};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct ConsumeArgs {
    /// Repository to consume batch jobs for
    #[arg(long)]
    repository: String,

    /// Consumer name within the `indexing-workers` group (default: host-pid)
    #[arg(long)]
    consumer_name: Option<String>,

    /// Path to the mnemolite-batch-worker binary (default: sibling of this executable)
    #[arg(long)]
    worker_binary: Option<PathBuf>,

    /// Per-batch subprocess timeout in seconds
    #[arg(long)]
    batch_timeout_secs: Option<u64>,
}

fn default_worker_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("mnemolite"));
    path.set_file_name("mnemolite-batch-worker");
    path
}

fn default_consumer_name() -> String {
    format!("{}-{}", hostname(), std::process::id())
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "host".to_string())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub async fn execute(args: ConsumeArgs, global: GlobalOptions) -> ExitCode {
    match run(args, global).await {
        Ok(true) => ExitCode::from(130),
        Ok(false) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "consumer failed");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` if the loop ended via signal, `Ok(false)` on clean exit.
async fn run(args: ConsumeArgs, global: GlobalOptions) -> anyhow::Result<bool> {
    let config = load_config(&global)?;
    let database_url = config.database_url.clone();
    let redis_for_opts = global
        .redis_url
        .clone()
        .or_else(|| config.cache_l2_url.clone())
        .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

    let pool = connect_storage(&config).await?;
    let chunks = mnemolite_storage::ChunkRepository::new(pool.clone());
    let graph_repo = mnemolite_storage::GraphRepository::new(pool.clone());
    let metrics_repo = mnemolite_storage::MetricsRepository::new(pool);
    let graph = GraphTrigger::new(chunks, graph_repo, metrics_repo);

    let client = redis_client(&global, &config)?;
    let opts = ConsumerOptions {
        consumer_name: args.consumer_name.unwrap_or_else(default_consumer_name),
        worker_binary: args.worker_binary.unwrap_or_else(default_worker_binary),
        batch_timeout: Duration::from_secs(args.batch_timeout_secs.unwrap_or_else(|| config.batch_timeout.as_secs())),
        database_url,
        redis_url: redis_for_opts,
    };

    let consumer = Arc::new(BatchConsumer::new(client, graph, opts));
    let stop = shutdown_flag();

    info!(repository = args.repository, "consumer starting");

    let run_consumer = consumer.clone();
    let run_stop = stop.clone();
    let repository = args.repository.clone();
    let mut handle = tokio::spawn(async move { run_consumer.run(&repository, run_stop).await });

    // Race the consumer loop against a shutdown signal. Dropping the other
    // branch's future on completion is safe here: the spawned task keeps
    // running until we explicitly await `handle` again, so a signal never
    // truncates the in-flight batch.
    let signalled = tokio::select! {
        result = &mut handle => {
            result.context("consumer task panicked")?.context("consumer loop failed")?;
            false
        }
        _ = wait_for_signal() => {
            info!("shutdown signal received, finishing in-flight batch");
            stop.store(true, Ordering::Relaxed);
            handle.await.context("consumer task panicked")?.context("consumer loop failed")?;
            true
        }
    };

    Ok(signalled)
}
