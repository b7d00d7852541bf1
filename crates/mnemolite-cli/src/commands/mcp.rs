//! MCP server command - exposes search_code/indexing_status over stdio.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use mnemolite_mcp::MnemoliteServer;
use mnemolite_stream::StatusRepository;
use rmcp::{transport::stdio, ServiceExt};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

use super::{build_searcher, connect_storage, load_config, redis_client};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct McpArgs {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

pub async fn execute(args: McpArgs, global: GlobalOptions) -> Result<()> {
    // stdout carries the MCP JSON-RPC protocol; logs must go to stderr.
    // try_init() tolerates a subscriber already set by a launching host.
    let log_level = if args.debug || global.verbose {
        Level::DEBUG
    } else if global.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    let _ = subscriber.try_init();

    let config = load_config(&global)?;
    let pool = connect_storage(&config).await?;
    let chunks = Arc::new(mnemolite_storage::ChunkRepository::new(pool.clone()));
    let searcher = Arc::new(build_searcher(pool, &config)?);
    let client = redis_client(&global, &config)?;
    let status = Arc::new(StatusRepository::new(client));

    let server = MnemoliteServer::new(searcher, chunks, status);

    info!("starting MnemoLite MCP server over stdio");
    let service = server.serve(stdio()).await.context("failed to start MCP service")?;

    tokio::select! {
        result = service.waiting() => {
            result.context("MCP service ended with error")?;
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
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
