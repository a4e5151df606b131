//! # LuatBot CLI
//!
//! Command-line front end for the Vietnamese road-traffic-law QA pipeline.
//!
//! Usage:
//!   luatbot ask "Xe máy chạy quá tốc độ bị phạt bao nhiêu tiền?"
//!   luatbot index --file data/chunks.json     # admin: (re)build the index
//!   luatbot status                            # index size and model identity

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use luatbot_core::LuatbotConfig;
use luatbot_core::types::{Chunk, Provenance, SourceRef};
use luatbot_index::{SqliteChunkStore, VectorIndex};
use luatbot_pipeline::{Outcome, Pipeline};

#[derive(Parser)]
#[command(
    name = "luatbot",
    version,
    about = "Hệ thống truy vấn thông tin Luật Giao Thông Việt Nam"
)]
struct Cli {
    /// Path to config.toml (default: ~/.luatbot/config.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question about Vietnamese road-traffic law.
    Ask {
        /// The question, in Vietnamese.
        question: String,
    },
    /// Embed and upsert processed chunks from a JSON file (admin path).
    Index {
        /// JSON array of {id, content, document, article?, clause?}.
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Report index size and embedding-model identity.
    Status,
}

/// One processed chunk as produced by the external ingestion job.
#[derive(Deserialize)]
struct ChunkRecord {
    id: String,
    content: String,
    document: String,
    #[serde(default)]
    article: Option<String>,
    #[serde(default)]
    clause: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "luatbot=debug" } else { "luatbot=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => LuatbotConfig::load_from(path)?,
        None => LuatbotConfig::load()?,
    };

    match cli.command {
        Command::Ask { question } => ask(&config, &question).await,
        Command::Index { file } => index(&config, &file).await,
        Command::Status => status(&config),
    }
}

async fn ask(config: &LuatbotConfig, question: &str) -> Result<()> {
    let pipeline = Pipeline::from_config(config).context("failed to start the pipeline")?;
    let response = pipeline.handle_question(question, &[]).await?;

    println!("{}", response.answer.text);
    if response.answer.provenance == Provenance::Grounded && !response.answer.citations.is_empty()
    {
        println!("\nNguồn: {}", response.answer.citations.join(", "));
    }

    if let Outcome::Failed { kind } = &response.outcome {
        tracing::warn!(kind = %kind, "request ended in a failure state");
    }
    Ok(())
}

async fn index(config: &LuatbotConfig, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let records: Vec<ChunkRecord> =
        serde_json::from_str(&content).context("chunk file is not a valid JSON array")?;

    let embedder = luatbot_providers::create_embedder(config)?;
    let index = VectorIndex::open(
        Path::new(&config.data.index_path),
        embedder.model_id(),
        embedder.dimension(),
    )?;

    let total = records.len();
    for record in records {
        let embedding = embedder.embed(&record.content).await?;
        index.upsert(
            Chunk {
                id: record.id,
                content: record.content,
                source: SourceRef {
                    document: record.document,
                    article: record.article,
                    clause: record.clause,
                },
            },
            embedding,
        )?;
    }
    println!("Đã lập chỉ mục {total} đoạn văn bản ({} tổng cộng).", index.len());
    Ok(())
}

fn status(config: &LuatbotConfig) -> Result<()> {
    let store = SqliteChunkStore::open(Path::new(&config.data.index_path))?;
    let model = store
        .model_identity()?
        .unwrap_or_else(|| "(chưa có)".into());
    println!(
        "Chỉ mục: {} đoạn văn bản, mô hình embedding: {model}",
        store.count()?
    );
    Ok(())
}
