//! Retrieval and synthesis pipelines - the core of the library.
//!
//! The pipeline covers:
//! - Ingest (chunk → embed → index)
//! - Retrieval with citation-tagged context assembly
//! - Topic extraction with a fixed fallback
//! - Mode-aware grounded answering
//! - FAQ generation with external questions or corpus-only fallback
//! - Map-reduce executive summary and checkpointed section summaries

pub mod answer;
pub mod chunker;
pub mod faq;
pub mod ingest;
pub mod knowledge_base;
pub mod parse;
pub mod prompts;
pub mod retriever;
pub mod summary;
pub mod topics;

pub use answer::{select_sources, Answer, Synthesizer, NOT_AVAILABLE_ANSWER};
pub use chunker::{chunk_source, chunk_text};
pub use faq::{FaqPipeline, FAQ_EXTRACTION_FAILED};
pub use ingest::{overview, Document, IngestReport, Ingestor, KnowledgeBaseOverview, SourceOverview};
pub use knowledge_base::KnowledgeBase;
pub use parse::{parse_json, strip_code_fences, Structured};
pub use prompts::REFUSAL_ANSWER;
pub use retriever::Retriever;
pub use summary::{SummaryPipeline, EMPTY_CORPUS_SUMMARY};
pub use topics::{TopicExtractor, TOPIC_COUNT};
