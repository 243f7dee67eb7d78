//! FAQ generation.
//!
//! Each topic is served by real external questions answered from the
//! knowledge base, or, when the question source has nothing, by questions
//! the model writes from a broader corpus context. Every per-topic and
//! per-question failure becomes a degraded item; the run always completes
//! and is persisted once at the end.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::answer::{Synthesizer, NOT_AVAILABLE_ANSWER};
use crate::pipeline::parse::{parse_json, Structured};
use crate::pipeline::prompts::format_kb_faq_prompt;
use crate::pipeline::retriever::Retriever;
use crate::pipeline::topics::TopicExtractor;
use crate::traits::{
    artifacts::ArtifactStore,
    llm::Llm,
    searcher::{ExternalQuestion, QuestionSource},
};
use crate::types::{
    config::EngineConfig,
    faq::{FaqItem, FaqOrigin, FaqReport, TopicFaqs},
};

/// Question used for the synthetic item when a topic's FAQs cannot be generated.
pub const FAQ_EXTRACTION_FAILED: &str = "FAQ extraction failed";

#[derive(Debug, Deserialize)]
struct GeneratedPair {
    question: String,
    answer: String,
}

/// Orchestrates topic selection, question sourcing and grounded answering.
pub struct FaqPipeline {
    topics: TopicExtractor,
    questions: Arc<dyn QuestionSource>,
    synthesizer: Synthesizer,
    retriever: Retriever,
    llm: Arc<dyn Llm>,
    artifacts: Arc<dyn ArtifactStore>,
    config: EngineConfig,
}

impl FaqPipeline {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn Llm>,
        questions: Arc<dyn QuestionSource>,
        artifacts: Arc<dyn ArtifactStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            topics: TopicExtractor::new(retriever.index().clone(), llm.clone(), config.clone()),
            synthesizer: Synthesizer::new(retriever.clone(), llm.clone(), config.answer_top_k),
            questions,
            retriever,
            llm,
            artifacts,
            config,
        }
    }

    /// Run the whole pipeline and persist the report.
    ///
    /// Returns an error only when the index cannot be read or the report
    /// cannot be saved.
    pub async fn run(&self, custom_topics: Option<&[String]>) -> Result<FaqReport> {
        let topics = self.topics.extract_topics(custom_topics).await?;
        info!(?topics, mode = self.config.mode.as_str(), "Generating FAQs");

        let mut groups = Vec::with_capacity(topics.len());
        let mut external = Vec::with_capacity(topics.len());

        for topic in topics {
            let candidates = self
                .questions
                .search(&topic, self.config.external_search_limit)
                .await;

            let faqs = if candidates.is_empty() {
                info!(topic = %topic, "No external questions, falling back to knowledge base");
                external.push(false);
                self.kb_fallback(&topic).await
            } else {
                external.push(true);
                self.answer_external(&topic, candidates).await
            };

            groups.push(TopicFaqs { topic, faqs });
        }

        let report = FaqReport::new(groups, self.config.mode, &external);
        self.artifacts.save_faq_report(&report).await?;

        info!(
            topics = report.metadata.total_topics,
            faqs = report.metadata.total_faqs,
            "FAQ report saved"
        );
        Ok(report)
    }

    /// Answer the most popular external questions from the knowledge base.
    async fn answer_external(&self, topic: &str, mut candidates: Vec<ExternalQuestion>) -> Vec<FaqItem> {
        // Stable, so equal scores keep the source's order
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(self.config.external_candidates);

        let mut faqs = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let (answer, sources, retrieval_distance) = match self
                .synthesizer
                .synthesize(&candidate.title, self.config.mode)
                .await
            {
                Ok(a) => (a.answer, a.sources, a.retrieval_distance),
                Err(e) => {
                    warn!(topic, question = %candidate.title, error = %e, "Retrieval failed");
                    (format!("Error generating answer: {}", e), Vec::new(), None)
                }
            };

            faqs.push(FaqItem {
                question: candidate.title,
                answer,
                sources,
                topic: topic.to_string(),
                retrieval_distance,
                origin: FaqOrigin::Stackoverflow,
                score: Some(candidate.score),
                view_count: Some(candidate.view_count),
                stackoverflow_link: Some(candidate.link),
            });
        }
        faqs
    }

    /// Generate FAQs for a topic from the corpus alone.
    async fn kb_fallback(&self, topic: &str) -> Vec<FaqItem> {
        let context = match self.retriever.retrieve(topic, self.config.kb_fallback_top_k).await {
            Ok(context) => context,
            Err(e) => {
                warn!(topic, error = %e, "Retrieval failed for fallback");
                return vec![FaqItem::generated(
                    topic,
                    FAQ_EXTRACTION_FAILED,
                    format!("Error generating FAQs: {}", e),
                    Vec::new(),
                    None,
                )];
            }
        };

        if context.is_empty() {
            return vec![FaqItem::generated(
                topic,
                format!("What does the documentation say about {}?", topic),
                NOT_AVAILABLE_ANSWER,
                Vec::new(),
                None,
            )];
        }

        let distance = context.best_distance();
        let first_source: Vec<String> = context.citations().first().map(str::to_string).into_iter().collect();
        let prompt = format_kb_faq_prompt(topic, context.text(), self.config.faqs_per_topic);

        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(topic, error = %e, "FAQ generation failed");
                return vec![FaqItem::generated(
                    topic,
                    FAQ_EXTRACTION_FAILED,
                    format!("Error generating FAQs: {}", e),
                    first_source,
                    distance,
                )];
            }
        };

        let pairs: Vec<GeneratedPair> = match parse_json::<Vec<GeneratedPair>>(&raw) {
            Structured::Parsed(pairs) => pairs
                .into_iter()
                .filter(|p| !p.question.trim().is_empty() && !p.answer.trim().is_empty())
                .take(self.config.faqs_per_topic)
                .collect(),
            Structured::Malformed(_) => Vec::new(),
        };

        if pairs.is_empty() {
            warn!(topic, "Generated FAQs could not be parsed");
            return vec![FaqItem::generated(
                topic,
                FAQ_EXTRACTION_FAILED,
                raw.trim(),
                first_source,
                distance,
            )];
        }

        let sources = context.citations().to_vec();
        pairs
            .into_iter()
            .map(|p| {
                FaqItem::generated(
                    topic,
                    p.question.trim(),
                    p.answer.trim(),
                    sources.clone(),
                    distance,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MemoryArtifactStore, MemoryIndex};
    use crate::testing::{FixedEmbedder, MockLlm, MockQuestionSource};
    use crate::traits::llm::PromptKind;
    use crate::traits::store::IndexRecord;
    use crate::types::chunk::Chunk;
    use crate::types::faq::{AnswerMode, SourcingStrategy};

    fn topics() -> Vec<String> {
        vec!["Routing".into(), "Validation".into(), "Testing".into()]
    }

    fn corpus() -> Arc<MemoryIndex> {
        Arc::new(MemoryIndex::from_records(vec![
            IndexRecord {
                chunk: Chunk::new("path-params", 0, "Declare path parameters with Python format syntax."),
                vector: vec![1.0, 0.0],
            },
            IndexRecord {
                chunk: Chunk::new("body", 0, "Use Pydantic models for request bodies."),
                vector: vec![0.0, 1.0],
            },
        ]))
    }

    struct Harness {
        pipeline: FaqPipeline,
        llm: Arc<MockLlm>,
        artifacts: Arc<MemoryArtifactStore>,
    }

    fn harness(index: Arc<MemoryIndex>, llm: MockLlm, questions: MockQuestionSource) -> Harness {
        harness_with_embedder(index, FixedEmbedder::new(2), llm, questions)
    }

    fn harness_with_embedder(
        index: Arc<MemoryIndex>,
        embedder: FixedEmbedder,
        llm: MockLlm,
        questions: MockQuestionSource,
    ) -> Harness {
        let llm = Arc::new(llm);
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let retriever = Retriever::new(index, Arc::new(embedder));
        let pipeline = FaqPipeline::new(
            retriever,
            llm.clone(),
            Arc::new(questions),
            artifacts.clone(),
            EngineConfig::default(),
        );
        Harness {
            pipeline,
            llm,
            artifacts,
        }
    }

    #[tokio::test]
    async fn test_external_questions_sorted_and_capped() {
        let questions = MockQuestionSource::new().with_results(
            "Routing",
            vec![
                ExternalQuestion::new("low", 1),
                ExternalQuestion::new("top", 50).with_view_count(900).with_link("https://so/1"),
                ExternalQuestion::new("mid", 10),
                ExternalQuestion::new("high", 20),
            ],
        );
        let h = harness(corpus(), MockLlm::new(), questions);

        let report = h.pipeline.run(Some(&topics())).await.unwrap();
        let routing = &report.topics[0];

        let titles: Vec<&str> = routing.faqs.iter().map(|f| f.question.as_str()).collect();
        assert_eq!(titles, vec!["top", "high", "mid"]);
        assert_eq!(routing.faqs[0].origin, FaqOrigin::Stackoverflow);
        assert_eq!(routing.faqs[0].score, Some(50));
        assert_eq!(routing.faqs[0].view_count, Some(900));
        assert_eq!(routing.faqs[0].stackoverflow_link.as_deref(), Some("https://so/1"));
        assert_eq!(report.metadata.question_source, SourcingStrategy::Mixed);
    }

    #[tokio::test]
    async fn test_fallback_generates_grounded_items() {
        let h = harness(corpus(), MockLlm::new(), MockQuestionSource::new());

        let report = h.pipeline.run(Some(&topics())).await.unwrap();

        assert_eq!(report.metadata.question_source, SourcingStrategy::KnowledgeBase);
        assert_eq!(report.metadata.total_topics, 3);
        assert_eq!(report.metadata.total_faqs, 9);
        for item in report.items() {
            assert_eq!(item.origin, FaqOrigin::KbGenerated);
            assert!(item.sources.iter().all(|s| s == "path-params" || s == "body"));
        }
        assert_eq!(h.llm.calls_of(PromptKind::KbFaq), 3);
    }

    #[tokio::test]
    async fn test_malformed_fallback_output_degrades_to_one_item() {
        let llm = MockLlm::new().with_response(PromptKind::KbFaq, "Question: what? Answer: this.");
        let h = harness(corpus(), llm, MockQuestionSource::new());

        let report = h.pipeline.run(Some(&topics())).await.unwrap();
        let faqs = &report.topics[0].faqs;

        assert_eq!(faqs.len(), 1);
        assert_eq!(faqs[0].question, FAQ_EXTRACTION_FAILED);
        assert_eq!(faqs[0].sources.len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_transport_error_degrades() {
        let llm = MockLlm::new().failing(PromptKind::KbFaq);
        let h = harness(corpus(), llm, MockQuestionSource::new());

        let report = h.pipeline.run(Some(&topics())).await.unwrap();

        assert_eq!(report.metadata.total_faqs, 3);
        assert!(report.items().all(|f| f.answer.starts_with("Error generating FAQs:")));
    }

    #[tokio::test]
    async fn test_fallback_retrieval_error_is_recorded() {
        let h = harness_with_embedder(
            corpus(),
            FixedEmbedder::new(2).failing(),
            MockLlm::new(),
            MockQuestionSource::new(),
        );

        let report = h.pipeline.run(Some(&topics())).await.unwrap();

        assert_eq!(report.metadata.total_faqs, 3);
        for item in report.items() {
            assert_eq!(item.question, FAQ_EXTRACTION_FAILED);
            assert!(item.answer.starts_with("Error generating FAQs:"));
            assert!(item.answer.contains("mock embedder unavailable"));
            assert_ne!(item.answer, NOT_AVAILABLE_ANSWER);
            assert!(item.sources.is_empty());
        }
        assert!(h.llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_yields_unsupported_items() {
        let h = harness(Arc::new(MemoryIndex::new()), MockLlm::new(), MockQuestionSource::new());

        let report = h.pipeline.run(Some(&topics())).await.unwrap();

        assert!(report.items().all(|f| f.is_unsupported() && f.answer == NOT_AVAILABLE_ANSWER));
        assert!(h.llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_report_persisted_once() {
        let h = harness(corpus(), MockLlm::new(), MockQuestionSource::new());

        let report = h.pipeline.run(Some(&topics())).await.unwrap();

        let saved = h.artifacts.load_faq_report().await.unwrap().unwrap();
        assert_eq!(saved, report);
        assert_eq!(saved.metadata.mode, AnswerMode::Strict);
    }
}
