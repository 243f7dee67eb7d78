//! The KnowledgeBase - main entry point for the engine.
//!
//! Owns the collaborators and hands them to each pipeline, so callers wire
//! backends once and then ingest, ask, and generate.

use std::sync::Arc;

use crate::error::Result;
use crate::pipeline::{
    answer::{Answer, Synthesizer},
    faq::FaqPipeline,
    ingest::{overview, Document, IngestReport, Ingestor, KnowledgeBaseOverview},
    retriever::Retriever,
    summary::SummaryPipeline,
    topics::TopicExtractor,
};
use crate::traits::{
    artifacts::ArtifactStore, embedder::Embedder, llm::Llm, searcher::QuestionSource,
    store::VectorIndex,
};
use crate::types::{
    config::EngineConfig,
    context::Context,
    faq::{AnswerMode, FaqReport},
    summary::{ExecutiveSummary, SectionRun},
};

/// A knowledge base over one vector index.
///
/// # Example
///
/// ```rust,ignore
/// let kb = KnowledgeBase::new(index, embedder, llm, questions, artifacts);
///
/// kb.ingest(&[Document::new(Source::from_file("body.md"), text)]).await?;
///
/// let answer = kb.ask("How do I declare a request body?", AnswerMode::Strict).await?;
/// let report = kb.faqs(None).await?;
/// ```
#[derive(Clone)]
pub struct KnowledgeBase {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn Llm>,
    questions: Arc<dyn QuestionSource>,
    artifacts: Arc<dyn ArtifactStore>,
    config: EngineConfig,
}

impl KnowledgeBase {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn Llm>,
        questions: Arc<dyn QuestionSource>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            questions,
            artifacts,
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactStore> {
        &self.artifacts
    }

    fn retriever(&self) -> Retriever {
        Retriever::new(self.index.clone(), self.embedder.clone())
    }

    /// Chunk, embed, and index documents.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        Ingestor::new(self.index.clone(), self.embedder.clone(), self.config.chunk_size)
            .ingest(documents)
            .await
    }

    /// Sources and chunk counts currently indexed.
    pub async fn overview(&self) -> Result<KnowledgeBaseOverview> {
        overview(self.index.as_ref()).await
    }

    /// Top `k` chunks for a query.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Context> {
        self.retriever().retrieve(query, k).await
    }

    /// Answer one question from the knowledge base.
    pub async fn ask(&self, question: &str, mode: AnswerMode) -> Result<Answer> {
        Synthesizer::new(self.retriever(), self.llm.clone(), self.config.answer_top_k)
            .synthesize(question, mode)
            .await
    }

    /// The three topics a FAQ run would use.
    pub async fn topics(&self, custom_topics: Option<&[String]>) -> Result<Vec<String>> {
        TopicExtractor::new(self.index.clone(), self.llm.clone(), self.config.clone())
            .extract_topics(custom_topics)
            .await
    }

    /// Generate and persist the FAQ report in the configured mode.
    pub async fn faqs(&self, custom_topics: Option<&[String]>) -> Result<FaqReport> {
        FaqPipeline::new(
            self.retriever(),
            self.llm.clone(),
            self.questions.clone(),
            self.artifacts.clone(),
            self.config.clone(),
        )
        .run(custom_topics)
        .await
    }

    fn summaries(&self) -> SummaryPipeline {
        SummaryPipeline::new(
            self.index.clone(),
            self.llm.clone(),
            self.artifacts.clone(),
            self.config.clone(),
        )
    }

    /// Build and persist the executive summary.
    pub async fn executive_summary(&self) -> Result<ExecutiveSummary> {
        self.summaries().executive_summary().await
    }

    /// Summarize sections not yet in the persisted map.
    pub async fn section_summaries(&self) -> Result<SectionRun> {
        self.summaries().section_summaries().await
    }
}
