//! Grounded answer synthesis.
//!
//! Citations returned to callers are always taken from the retrieved
//! context's citation set. The model's own bracketed claims only narrow that
//! set; they can never add a source that was not retrieved.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::pipeline::prompts::{format_answer_prompt, REFUSAL_ANSWER};
use crate::pipeline::retriever::Retriever;
use crate::traits::llm::Llm;
use crate::types::{context::Context, faq::AnswerMode};

/// Answer returned when retrieval finds nothing to ground on.
pub const NOT_AVAILABLE_ANSWER: &str = "Not found in knowledge base.";

/// A synthesized answer and the context it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,

    /// Subset of `context.citations()`, in citation order
    pub sources: Vec<String>,

    pub retrieval_distance: Option<f32>,

    pub context: Context,
}

impl Answer {
    fn not_available() -> Self {
        Self {
            answer: NOT_AVAILABLE_ANSWER.to_string(),
            sources: Vec::new(),
            retrieval_distance: None,
            context: Context::default(),
        }
    }

    /// Whether the answer is the no-grounding sentinel.
    pub fn is_not_available(&self) -> bool {
        self.context.is_empty()
    }
}

/// Retrieval-augmented answering.
#[derive(Clone)]
pub struct Synthesizer {
    retriever: Retriever,
    llm: Arc<dyn Llm>,
    top_k: usize,
}

impl Synthesizer {
    pub fn new(retriever: Retriever, llm: Arc<dyn Llm>, top_k: usize) -> Self {
        Self {
            retriever,
            llm,
            top_k,
        }
    }

    /// Answer `question` from the knowledge base.
    ///
    /// Never fails because of the model: an empty context returns the
    /// sentinel without calling it, and a transport error returns an error
    /// string citing the best retrieved source. Only retrieval failures
    /// (embedding or index) are errors.
    pub async fn synthesize(&self, question: &str, mode: AnswerMode) -> Result<Answer> {
        let context = self.retriever.retrieve(question, self.top_k).await?;
        if context.is_empty() {
            debug!(question, "No grounding, returning sentinel");
            return Ok(Answer::not_available());
        }

        let prompt = format_answer_prompt(question, context.text(), mode);
        let retrieval_distance = context.best_distance();

        match self.llm.generate(&prompt).await {
            Ok(answer) => {
                let sources = select_sources(&answer, &context, mode);
                debug!(question, mode = mode.as_str(), sources = sources.len(), "Synthesized answer");
                Ok(Answer {
                    answer,
                    sources,
                    retrieval_distance,
                    context,
                })
            }
            Err(e) => {
                warn!(question, error = %e, "Answer generation failed");
                Ok(Answer {
                    answer: format!("Error generating answer: {}", e),
                    sources: context.citations().first().map(str::to_string).into_iter().collect(),
                    retrieval_distance,
                    context,
                })
            }
        }
    }
}

/// Pick the citations to attach to an answer.
///
/// Flexible answers carry the whole citation set. Strict answers carry the
/// retrieved sources the answer names, the whole set when it names none,
/// and nothing when the model refused.
pub fn select_sources(answer: &str, context: &Context, mode: AnswerMode) -> Vec<String> {
    let citations = context.citations();

    match mode {
        AnswerMode::Flexible => citations.to_vec(),
        AnswerMode::Strict => {
            if is_refusal(answer) {
                return Vec::new();
            }

            let cited: Vec<String> = citations
                .iter()
                .filter(|source| answer.contains(&format!("[{}]", source)))
                .map(str::to_string)
                .collect();

            if cited.is_empty() {
                citations.to_vec()
            } else {
                cited
            }
        }
    }
}

/// Whether a strict answer contains the refusal phrase anywhere.
pub fn is_refusal(answer: &str) -> bool {
    let normalized = normalize(answer);
    let refusal = normalize(REFUSAL_ANSWER);
    normalized.contains(refusal.trim_end_matches('.'))
}

/// Lowercase with whitespace runs collapsed to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryIndex;
    use crate::testing::{FixedEmbedder, MockLlm};
    use crate::traits::llm::PromptKind;
    use crate::traits::store::IndexRecord;
    use crate::types::chunk::{Chunk, RetrievalHit};

    fn context(sources: &[&str]) -> Context {
        Context::from_hits(
            sources
                .iter()
                .enumerate()
                .map(|(i, s)| RetrievalHit {
                    chunk: Chunk::new(*s, 0, "text"),
                    distance: i as f32 * 0.1,
                    rank: i,
                })
                .collect(),
        )
    }

    fn synthesizer(index: MemoryIndex, llm: Arc<MockLlm>) -> Synthesizer {
        let embedder = FixedEmbedder::new(2).with_vector("How do I read a body?", vec![1.0, 0.0]);
        let retriever = Retriever::new(Arc::new(index), Arc::new(embedder));
        Synthesizer::new(retriever, llm, 3)
    }

    fn corpus() -> MemoryIndex {
        MemoryIndex::from_records(vec![
            IndexRecord {
                chunk: Chunk::new("body", 0, "Declare a Pydantic model to read a request body."),
                vector: vec![1.0, 0.0],
            },
            IndexRecord {
                chunk: Chunk::new("query-params", 0, "Function parameters become query parameters."),
                vector: vec![0.8, 0.2],
            },
        ])
    }

    #[test]
    fn test_strict_keeps_only_named_retrieved_sources() {
        let ctx = context(&["body", "query-params", "path-params"]);
        let sources = select_sources(
            "Use a model [path-params] and see [body]. Also [invented-source].",
            &ctx,
            AnswerMode::Strict,
        );
        assert_eq!(sources, vec!["body", "path-params"]);
    }

    #[test]
    fn test_strict_without_named_sources_uses_citation_set() {
        let ctx = context(&["body", "query-params"]);
        assert_eq!(
            select_sources("Use a model.", &ctx, AnswerMode::Strict),
            vec!["body", "query-params"]
        );
    }

    #[test]
    fn test_strict_refusal_has_no_sources() {
        let ctx = context(&["body"]);
        assert!(select_sources(REFUSAL_ANSWER, &ctx, AnswerMode::Strict).is_empty());
        assert!(select_sources(&format!("\"{}\"", REFUSAL_ANSWER), &ctx, AnswerMode::Strict).is_empty());
    }

    #[test]
    fn test_strict_refusal_after_preamble_has_no_sources() {
        let ctx = context(&["body"]);
        let answer = format!(
            "The excerpts cover request bodies [body], but not uploads.\n{}",
            REFUSAL_ANSWER.replace(' ', "  ")
        );
        assert!(is_refusal(&answer));
        assert!(select_sources(&answer, &ctx, AnswerMode::Strict).is_empty());
        assert!(!is_refusal("Declare a model [body]."));
    }

    #[test]
    fn test_flexible_uses_citation_set() {
        let ctx = context(&["body", "query-params"]);
        assert_eq!(
            select_sources("[body] only", &ctx, AnswerMode::Flexible),
            vec!["body", "query-params"]
        );
    }

    #[tokio::test]
    async fn test_empty_index_returns_sentinel_without_llm() {
        let llm = Arc::new(MockLlm::new());
        let answer = synthesizer(MemoryIndex::new(), llm.clone())
            .synthesize("How do I read a body?", AnswerMode::Strict)
            .await
            .unwrap();

        assert_eq!(answer.answer, NOT_AVAILABLE_ANSWER);
        assert!(answer.sources.is_empty());
        assert!(answer.is_not_available());
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_answer_is_grounded() {
        let llm = Arc::new(MockLlm::new().with_response(
            PromptKind::Answer,
            "Declare a model [body]. See also [fastapi-docs].",
        ));
        let answer = synthesizer(corpus(), llm.clone())
            .synthesize("How do I read a body?", AnswerMode::Strict)
            .await
            .unwrap();

        assert_eq!(answer.sources, vec!["body"]);
        assert_eq!(answer.retrieval_distance, answer.context.best_distance());
        assert!(llm.calls()[0].text.contains("[body] Declare a Pydantic model"));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades() {
        let llm = Arc::new(MockLlm::new().failing(PromptKind::Answer));
        let answer = synthesizer(corpus(), llm)
            .synthesize("How do I read a body?", AnswerMode::Flexible)
            .await
            .unwrap();

        assert!(answer.answer.starts_with("Error generating answer:"));
        assert_eq!(answer.sources, vec!["body"]);
    }
}
