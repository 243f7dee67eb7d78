//! Knowledge base CLI
//!
//! Usage:
//!   kb ingest docs/*.md
//!   kb ask "How do I declare a path parameter?"
//!   kb faqs --topic "Routing" --topic "Validation" --topic "Testing"
//!   kb summarize
//!   kb sections

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use kb_engine::{
    ai::{HashEmbedder, LlmExt, OfflineLlm, OpenAiCompat},
    security::{ExposeSecret, LlmCredentials},
    stores::{FileIndex, FsArtifactStore, DEFAULT_COLLECTION},
    AnswerMode, Document, Embedder, EngineConfig, KnowledgeBase, Llm, Source, StackOverflowSource,
};

#[derive(Parser)]
#[command(name = "kb")]
#[command(about = "Grounded answers, FAQs and summaries over a document corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and index text files (re-ingesting a file replaces it)
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List indexed sources and chunk counts
    Overview,

    /// Answer a question from the knowledge base
    Ask {
        question: String,

        /// Allow general knowledge to fill gaps in the documents
        #[arg(long)]
        flexible: bool,
    },

    /// Show the topics a FAQ run would use
    Topics {
        /// Custom topic (exactly three to override extraction)
        #[arg(long = "topic")]
        topics: Vec<String>,
    },

    /// Generate the FAQ report
    Faqs {
        /// Custom topic (exactly three to override extraction)
        #[arg(long = "topic")]
        topics: Vec<String>,

        /// Allow general knowledge to fill gaps in the documents
        #[arg(long)]
        flexible: bool,
    },

    /// Generate the executive summary
    Summarize,

    /// Summarize sections not yet summarized
    Sections,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kb_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let mode = match &cli.command {
        Commands::Ask { flexible, .. } | Commands::Faqs { flexible, .. } => AnswerMode::from_strict(!flexible),
        _ => AnswerMode::Strict,
    };
    let kb = build_knowledge_base(&config, mode).await?;

    match cli.command {
        Commands::Ingest { files } => ingest(&kb, &files).await?,
        Commands::Overview => {
            let overview = kb.overview().await?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        Commands::Ask { question, .. } => {
            let answer = kb.ask(&question, mode).await?;
            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!("\nSources: {}", answer.sources.join(", "));
            }
        }
        Commands::Topics { topics } => {
            for topic in kb.topics(custom_topics(&topics)).await? {
                println!("{}", topic);
            }
        }
        Commands::Faqs { topics, .. } => {
            let report = kb.faqs(custom_topics(&topics)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Summarize => {
            let summary = kb.executive_summary().await?;
            println!("{}", summary.summary);
            if !summary.failed_chunks.is_empty() {
                eprintln!("Failed chunks: {}", summary.failed_chunks.join(", "));
            }
        }
        Commands::Sections => {
            let run = kb.section_summaries().await?;
            println!("{}", serde_json::to_string_pretty(&run.summaries)?);
            eprintln!(
                "Generated {}, skipped {}, failed {}",
                run.generated.len(),
                run.skipped.len(),
                run.failed.len()
            );
        }
    }

    Ok(())
}

// ============================================================================
// Wiring
// ============================================================================

async fn build_knowledge_base(config: &Config, mode: AnswerMode) -> Result<KnowledgeBase> {
    let (llm, embedder) = if config.use_mock_llm {
        tracing::info!("Using offline LLM and hash embedder");
        let llm: Arc<dyn Llm> = Arc::new(OfflineLlm::new());
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        (llm, embedder)
    } else {
        let api_key = config
            .api_key
            .as_ref()
            .context("OPENROUTER_API_KEY must be set")?;
        let credentials = LlmCredentials::new(api_key.expose_secret(), &config.llm_model, &config.api_base)?;
        let backend = OpenAiCompat::new(credentials)?.with_embedding_model(&config.embedding_model);

        tracing::info!(model = %config.llm_model, base = %config.api_base, "Using remote LLM");
        let llm: Arc<dyn Llm> = Arc::new(backend.clone().throttled_by(config.llm_min_interval));
        let embedder: Arc<dyn Embedder> = Arc::new(backend);
        (llm, embedder)
    };

    let index = FileIndex::open(&config.data_dir, DEFAULT_COLLECTION)
        .await
        .with_context(|| format!("Failed to open index in {}", config.data_dir.display()))?;

    let mut questions = StackOverflowSource::new();
    if let Some(key) = &config.stackexchange_key {
        questions = questions.with_api_key(key.as_str());
    }
    if let Some(tag) = &config.stackexchange_tag {
        questions = questions.with_tag(tag.as_str());
    }

    let mut engine_config = EngineConfig::default().with_mode(mode);
    if let Some(size) = config.chunk_size {
        engine_config = engine_config.with_chunk_size(size);
    }

    Ok(KnowledgeBase::new(
        Arc::new(index),
        embedder,
        llm,
        Arc::new(questions),
        Arc::new(FsArtifactStore::new(&config.data_dir)),
    )
    .with_config(engine_config))
}

fn custom_topics(topics: &[String]) -> Option<&[String]> {
    if topics.is_empty() {
        None
    } else {
        Some(topics)
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn ingest(kb: &KnowledgeBase, files: &[PathBuf]) -> Result<()> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        documents.push(Document::new(Source::from_file(&path.to_string_lossy()), text));
    }

    let report = kb.ingest(&documents).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_success() {
        anyhow::bail!("{} file(s) failed to ingest", report.failed_sources.len());
    }
    Ok(())
}
