//! Retrieval and Grounded Synthesis Engine
//!
//! Chunks and embeds a document corpus, retrieves passages by vector
//! similarity, and has an LLM write answers, FAQs, and summaries that cite
//! only what was actually retrieved.
//!
//! # Design Philosophy
//!
//! - Citations come from retrieval metadata, never from model text
//! - Every per-item failure degrades to a present, inspectable result
//! - Structured model output is parsed into `Parsed | Malformed`, never panics
//! - Collaborators (index, embedder, LLM, question source, artifacts) are traits
//!
//! # Usage
//!
//! ```rust,ignore
//! use kb_engine::{KnowledgeBase, Document, Source, AnswerMode};
//! use kb_engine::ai::{HashEmbedder, OfflineLlm};
//! use kb_engine::stores::{MemoryArtifactStore, MemoryIndex};
//! use kb_engine::testing::MockQuestionSource;
//!
//! let kb = KnowledgeBase::new(
//!     Arc::new(MemoryIndex::new()),
//!     Arc::new(HashEmbedder::default()),
//!     Arc::new(OfflineLlm::new()),
//!     Arc::new(MockQuestionSource::new()),
//!     Arc::new(MemoryArtifactStore::new()),
//! );
//!
//! kb.ingest(&[Document::new(Source::from_file("body.md"), text)]).await?;
//! let answer = kb.ask("How do I read a request body?", AnswerMode::Strict).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (Llm, Embedder, VectorIndex, QuestionSource, ArtifactStore)
//! - [`types`] - Chunks, contexts, FAQ and summary records, configuration
//! - [`pipeline`] - Chunking, retrieval, answering, FAQ and summary pipelines
//! - [`stores`] - In-memory and file-backed index and artifact stores
//! - [`ai`] - OpenAI-compatible backend, offline backends, throttling
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{EngineError, Result};
pub use pipeline::{
    Answer, Document, FaqPipeline, IngestReport, Ingestor, KnowledgeBase, KnowledgeBaseOverview,
    Retriever, Structured, SummaryPipeline, Synthesizer, TopicExtractor,
};
pub use traits::{
    artifacts::ArtifactStore,
    embedder::Embedder,
    llm::{Llm, Prompt, PromptKind},
    searcher::{ExternalQuestion, QuestionSource, StackOverflowSource},
    store::{IndexRecord, VectorIndex},
};
pub use types::{
    chunk::{Chunk, RetrievalHit, Source},
    config::EngineConfig,
    context::{CitationSet, Context},
    faq::{AnswerMode, FaqItem, FaqMetadata, FaqOrigin, FaqReport, SourcingStrategy, TopicFaqs},
    summary::{ExecutiveSummary, SectionRun, SectionSummaries},
};
