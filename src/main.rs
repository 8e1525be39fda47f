use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragindex::config::Config;
use ragindex::mcp::server::{McpContext, McpServer};
use ragindex::retriever::Retriever;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ragindex")]
#[command(about = "Cached vector index and top-K retrieval over a document folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the JSON config file (default: ragindex.json)
    #[arg(short, long, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index, or reuse the cached one if the corpus is unchanged
    Build,
    /// Print the documents most similar to QUERY as JSON
    Search {
        query: String,
        /// Number of results (default from config)
        #[arg(short = 'k', long, allow_negative_numbers = true)]
        top_k: Option<i64>,
    },
    /// Print the loaded corpus as JSON
    List,
    /// Print the retrieval policy document
    Policy,
    /// Serve the MCP tools over stdio
    Serve,
}

/// Logs go to stderr; stdout carries JSON output and the MCP transport.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    let retriever =
        Retriever::from_config(&config).context("failed to initialize retriever")?;

    match cli.command {
        Command::Build => {
            let stats = retriever.rebuild().await.context("index build failed")?;
            info!(
                "Index ready: {} documents ({})",
                stats.documents,
                if stats.cache_hit { "cache hit" } else { "rebuilt" }
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "documents": stats.documents,
                    "cache_hit": stats.cache_hit,
                    "batches": stats.batches,
                    "dimensions": stats.dimensions,
                    "embedding_model": retriever.model(),
                }))?
            );
        }
        Command::Search { query, top_k } => {
            let k = match top_k {
                Some(n) => usize::try_from(n).unwrap_or(0),
                None => config.search_top_k,
            };
            let results = retriever.search(&query, k).await.context("search failed")?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::List => {
            let docs = retriever.documents().context("failed to load corpus")?;
            println!("{}", serde_json::to_string_pretty(&docs)?);
        }
        Command::Policy => {
            let policy = retriever.policy().context("failed to load policy")?;
            print!("{policy}");
        }
        Command::Serve => {
            let ctx = McpContext {
                retriever: Arc::new(retriever),
                config: Arc::new(config),
            };
            McpServer::new(ctx).start().await?;
        }
    }

    Ok(())
}
