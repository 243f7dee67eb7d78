//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the engine without
//! making real LLM, embedding, or network calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::ai::{HashEmbedder, OfflineLlm};
use crate::error::{EngineError, Result};
use crate::traits::{
    embedder::Embedder,
    llm::{Llm, Prompt, PromptKind},
    searcher::{ExternalQuestion, QuestionSource},
};

/// A scriptable mock LLM.
///
/// Responses are chosen by [`PromptKind`]. A scripted sequence is consumed
/// call by call and its last entry repeats; unscripted kinds fall back to
/// the [`OfflineLlm`] canned response.
#[derive(Default)]
pub struct MockLlm {
    responses: RwLock<HashMap<PromptKind, Vec<String>>>,
    failing: RwLock<HashSet<PromptKind>>,
    failing_calls: RwLock<HashSet<(PromptKind, usize)>>,
    calls: RwLock<Vec<Prompt>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `kind` with `response`.
    pub fn with_response(self, kind: PromptKind, response: impl Into<String>) -> Self {
        self.write_responses().insert(kind, vec![response.into()]);
        self
    }

    /// Answer successive `kind` calls with `responses` in order.
    pub fn with_responses(self, kind: PromptKind, responses: Vec<&str>) -> Self {
        self.write_responses()
            .insert(kind, responses.into_iter().map(str::to_string).collect());
        self
    }

    /// Fail every call of `kind` with a transport error.
    pub fn failing(self, kind: PromptKind) -> Self {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);
        self
    }

    /// Fail only the `n`th (zero-based) call of `kind`.
    pub fn failing_call(self, kind: PromptKind, n: usize) -> Self {
        self.failing_calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((kind, n));
        self
    }

    /// Every prompt received, in order.
    pub fn calls(&self) -> Vec<Prompt> {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of prompts of one kind received.
    pub fn calls_of(&self, kind: PromptKind) -> usize {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| p.kind == kind)
            .count()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn write_responses(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PromptKind, Vec<String>>> {
        self.responses.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let nth = self.calls_of(prompt.kind);
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.clone());

        let fails = self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&prompt.kind)
            || self
                .failing_calls
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&(prompt.kind, nth));
        if fails {
            return Err(EngineError::Transport(format!("mock {} failure", prompt.kind)));
        }

        let responses = self.responses.read().unwrap_or_else(PoisonError::into_inner);
        Ok(match responses.get(&prompt.kind) {
            Some(scripted) if !scripted.is_empty() => scripted[nth.min(scripted.len() - 1)].clone(),
            _ => OfflineLlm::response_for(prompt.kind).to_string(),
        })
    }
}

/// Embedder with explicit vectors for chosen texts.
///
/// Texts without a fixed vector are hashed deterministically.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: HashEmbedder,
    failing: bool,
}

impl FixedEmbedder {
    /// `dim` must match the fixed vectors' length.
    pub fn new(dim: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: HashEmbedder::new(dim),
            failing: false,
        }
    }

    /// Fail every call, as an unreachable embedding service would.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.failing {
            return Err(EngineError::Embedding("mock embedder unavailable".into()));
        }

        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            match self.vectors.get(text) {
                Some(v) => out.push(v.clone()),
                None => out.push(self.fallback.embed_one(text).await?),
            }
        }
        Ok(out)
    }
}

/// Question source returning predefined results per query.
#[derive(Default)]
pub struct MockQuestionSource {
    results: RwLock<HashMap<String, Vec<ExternalQuestion>>>,
    queries: RwLock<Vec<String>>,
}

impl MockQuestionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for a query.
    pub fn with_results(self, query: &str, results: Vec<ExternalQuestion>) -> Self {
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.to_string(), results);
        self
    }

    /// Queries received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl QuestionSource for MockQuestionSource {
    async fn search(&self, query: &str, limit: usize) -> Vec<ExternalQuestion> {
        self.queries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        let mut results = self
            .results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
            .cloned()
            .unwrap_or_default();
        results.truncate(limit);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_llm_scripted_sequence_repeats_last() {
        let llm = MockLlm::new().with_responses(PromptKind::ExecutiveMap, vec!["one", "two"]);
        let prompt = Prompt::new(PromptKind::ExecutiveMap, "text");

        assert_eq!(llm.generate(&prompt).await.unwrap(), "one");
        assert_eq!(llm.generate(&prompt).await.unwrap(), "two");
        assert_eq!(llm.generate(&prompt).await.unwrap(), "two");
        assert_eq!(llm.calls_of(PromptKind::ExecutiveMap), 3);
    }

    #[tokio::test]
    async fn test_mock_llm_failing_call() {
        let llm = MockLlm::new().failing_call(PromptKind::SectionSummary, 1);
        let prompt = Prompt::new(PromptKind::SectionSummary, "text");

        assert!(llm.generate(&prompt).await.is_ok());
        assert!(llm.generate(&prompt).await.unwrap_err().is_transport());
        assert!(llm.generate(&prompt).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_llm_unscripted_kind_uses_offline_response() {
        let llm = MockLlm::new();
        let response = llm
            .generate(&Prompt::new(PromptKind::TopicExtraction, "sample"))
            .await
            .unwrap();
        assert_eq!(response, OfflineLlm::response_for(PromptKind::TopicExtraction));
    }

    #[tokio::test]
    async fn test_fixed_embedder() {
        let embedder = FixedEmbedder::new(2).with_vector("x", vec![1.0, 0.0]);
        let vectors = embedder.embed(&["x".to_string(), "y".to_string()]).await.unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1].len(), 2);
    }

    #[tokio::test]
    async fn test_mock_question_source() {
        let source = MockQuestionSource::new().with_results(
            "Routing",
            vec![ExternalQuestion::new("a", 3), ExternalQuestion::new("b", 2)],
        );

        assert_eq!(source.search("Routing", 1).await.len(), 1);
        assert!(source.search("Other", 5).await.is_empty());
        assert_eq!(source.queries(), vec!["Routing", "Other"]);
    }
}
