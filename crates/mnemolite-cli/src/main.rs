//! MnemoLite CLI - batch indexing producer/consumer, hybrid search, and MCP server.
//!
//! # Usage
//!
//! ```bash
//! # Scan a repository tree and enqueue batch indexing jobs
//! mnemolite produce ./my-repo --repository my-repo
//!
//! # Run the consumer daemon that drains enqueued batches
//! mnemolite consume --repository my-repo
//!
//! # Hybrid lexical + vector search
//! mnemolite search "authentication middleware" --repository my-repo
//!
//! # Check a repository's indexing job status
//! mnemolite status my-repo
//!
//! # Start the MCP server for AI assistant integration
//! mnemolite mcp
//! ```

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod progress;

#[derive(Parser, Debug)]
#[command(name = "mnemolite")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Postgres connection string (default: $DATABASE_URL, or the config default)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Redis connection string (default: $REDIS_URL, or CACHE_L2_URL, or localhost)
    #[arg(long, global = true, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a repository tree and enqueue batch indexing jobs (C7)
    Produce(commands::produce::ProduceArgs),

    /// Run the batch indexing consumer daemon for a repository (C8)
    Consume(commands::consume::ConsumeArgs),

    /// Hybrid lexical + vector code search (C10-C13)
    Search(commands::search::SearchArgs),

    /// Show a repository's batch indexing job status
    Status(commands::status::StatusArgs),

    /// Manually rebuild a repository's call/containment graph (C9)
    GraphBuild(commands::graph_build::GraphBuildArgs),

    /// Start the MCP server for AI assistant integration
    Mcp(commands::mcp::McpArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.global.quiet {
        Level::ERROR
    } else if cli.global.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // The MCP command sets up its own tracing (ansi=false, stderr-only, and
    // tolerant of a subscriber already installed by a launching host).
    if !matches!(cli.command, Commands::Mcp(_)) {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("warning: a tracing subscriber was already installed");
        }
    }

    let result = match cli.command {
        Commands::Produce(args) => commands::produce::execute(args, cli.global).await.map(|_| ExitCode::SUCCESS),
        Commands::Consume(args) => return commands::consume::execute(args, cli.global).await,
        Commands::Search(args) => commands::search::execute(args, cli.global).await.map(|_| ExitCode::SUCCESS),
        Commands::Status(args) => commands::status::execute(args, cli.global).await.map(|_| ExitCode::SUCCESS),
        Commands::GraphBuild(args) => commands::graph_build::execute(args, cli.global).await.map(|_| ExitCode::SUCCESS),
        Commands::Mcp(args) => commands::mcp::execute(args, cli.global).await.map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            commands::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
