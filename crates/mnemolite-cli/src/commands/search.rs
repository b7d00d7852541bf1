//! Search command - hybrid lexical + vector code search.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use mnemolite_search::HybridFilters;

use super::{build_searcher, connect_storage, load_config};
use crate::GlobalOptions;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    query: String,

    /// Restrict results to this repository
    #[arg(long)]
    repository: Option<String>,

    /// Restrict results to this language
    #[arg(long)]
    language: Option<String>,

    /// Restrict results to this chunk type (function, method, class, interface, module)
    #[arg(long = "type")]
    chunk_type: Option<String>,

    /// Maximum number of results to return
    #[arg(long, short = 'n', default_value = "10")]
    limit: usize,

    /// Skip the cross-encoder rerank pass
    #[arg(long)]
    no_rerank: bool,

    /// Candidate pool size fed into fusion/reranking
    #[arg(long, default_value = "50")]
    pool_size: usize,

    /// Output format: text (default), json
    #[arg(long, short = 'o', default_value = "text")]
    output: OutputFormat,
}

pub async fn execute(args: SearchArgs, global: GlobalOptions) -> Result<()> {
    let config = load_config(&global)?;
    let pool = connect_storage(&config).await?;
    let chunks = mnemolite_storage::ChunkRepository::new(pool.clone());
    let searcher = build_searcher(pool, &config)?;

    let filters = HybridFilters {
        repository: args.repository.clone(),
        language: args.language.clone(),
        chunk_type: args.chunk_type.clone(),
        file_path_contains: None,
    };

    let hits = searcher
        .search(&args.query, &filters, args.limit, !args.no_rerank, args.pool_size)
        .await
        .context("search failed")?;

    if hits.is_empty() {
        if !global.quiet {
            eprintln!("No results found for: {}", args.query);
        }
        return Ok(());
    }

    match args.output {
        OutputFormat::Json => {
            let mut rows = Vec::with_capacity(hits.len());
            for hit in &hits {
                let Some(chunk) = chunks.get_by_id(hit.chunk_id).await.context("chunk lookup failed")? else {
                    continue;
                };
                rows.push(serde_json::json!({
                    "chunk_id": hit.chunk_id,
                    "name_path": chunk.name_path,
                    "chunk_type": chunk.chunk_type.as_str(),
                    "file_path": chunk.file_path,
                    "start_line": chunk.start_line,
                    "end_line": chunk.end_line,
                    "rrf_score": hit.rrf_score,
                    "rerank_score": hit.rerank_score,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if !global.quiet {
                println!("Found {} results for \"{}\":\n", hits.len(), args.query);
            }
            for (i, hit) in hits.iter().enumerate() {
                let Some(chunk) = chunks.get_by_id(hit.chunk_id).await.context("chunk lookup failed")? else {
                    continue;
                };
                println!("{}. {} ({})", i + 1, chunk.name_path, chunk.chunk_type.as_str());
                println!("   {}:{}-{}", chunk.file_path, chunk.start_line, chunk.end_line);
                let rerank = hit
                    .rerank_score
                    .map(|s| format!("  rerank={s:.3}"))
                    .unwrap_or_default();
                println!("   rrf={:.4}{rerank}", hit.rrf_score);
                println!();
            }
        }
    }

    Ok(())
}
