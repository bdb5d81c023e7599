//! `ragfuse` command-line front end.

mod corpus;

use clap::{Parser, Subcommand};
use ragfuse_assistant::ResearchAssistant;
use ragfuse_core::RagfuseConfig;
use ragfuse_search::{InMemoryVectorIndex, LocalEmbedding, SerperWebSearch};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragfuse", about = "Hybrid document and web retrieval")]
struct Cli {
    /// Path to config file (optional; defaults apply when missing)
    #[arg(short, long, default_value = "ragfuse.toml")]
    config: PathBuf,

    /// JSONL corpus of pre-chunked documents to index
    #[arg(long)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single query
    Query {
        /// Query text
        text: String,
        /// Session to record the query under
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Skip the query cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Run every query in a file (one per line), uncached
    Benchmark {
        /// File with one query per line
        file: PathBuf,
    },
    /// Print system statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli.config)?.with_env_overrides()?;
    let web = SerperWebSearch::new(config.web.clone())?;
    if !web.has_api_key() {
        warn!("SERPER_API_KEY not set; queries will use documents only");
    }

    let vector = Arc::new(InMemoryVectorIndex::new(Arc::new(LocalEmbedding::default())));
    let assistant = ResearchAssistant::new(config, vector, Arc::new(web))?;

    if let Some(path) = &cli.corpus {
        let chunks = corpus::load_corpus(path).await?;
        let count = chunks.len();
        assistant.add_documents(chunks).await?;
        info!(chunks = count, corpus = %path.display(), "Corpus indexed");
    }

    match cli.command {
        Commands::Query {
            text,
            session,
            no_cache,
        } => {
            let response = assistant.query(&text, &session, !no_cache).await;
            print_json(&response)?;
        }
        Commands::Benchmark { file } => {
            let queries = corpus::load_queries(&file).await?;
            info!(queries = queries.len(), "Running benchmark");
            let report = assistant.benchmark(&queries).await;
            print_json(&report)?;
        }
        Commands::Stats => {
            let stats = assistant.system_stats().await?;
            print_json(&stats)?;
        }
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> anyhow::Result<RagfuseConfig> {
    if path.exists() {
        info!(path = %path.display(), "Loading configuration");
        Ok(RagfuseConfig::load(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(RagfuseConfig::default())
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
