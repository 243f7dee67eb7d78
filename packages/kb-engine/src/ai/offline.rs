//! Deterministic offline backends.
//!
//! `OfflineLlm` answers by [`PromptKind`] with canned, well-formed output and
//! `HashEmbedder` derives vectors from a SHA-256 of the text. Together they
//! run every pipeline end-to-end without network access or API keys.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::traits::{
    embedder::Embedder,
    llm::{Llm, Prompt, PromptKind},
};

/// Canned-response LLM for running without a live model.
#[derive(Debug, Clone, Default)]
pub struct OfflineLlm;

impl OfflineLlm {
    pub fn new() -> Self {
        Self
    }

    /// The response returned for a given kind.
    pub fn response_for(kind: PromptKind) -> &'static str {
        match kind {
            PromptKind::TopicExtraction => {
                r#"["Getting Started", "Request Handling", "Dependencies and Security"]"#
            }
            PromptKind::Answer => {
                "This is an offline answer. The retrieved documentation covers this topic; \
                 connect a live model for a generated explanation."
            }
            PromptKind::KbFaq => {
                r#"[
  {"question": "What is this documentation about?", "answer": "It explains the main concepts and how to apply them."},
  {"question": "How do I get started?", "answer": "Follow the first steps section and run the minimal example."},
  {"question": "Where can I find more details?", "answer": "Each section of the documentation covers one feature in depth."}
]"#
            }
            PromptKind::ExecutiveMap => "Offline partial summary of one documentation excerpt.",
            PromptKind::ExecutiveReduce => {
                "Offline executive summary: the documentation introduces the framework, \
                 its core features, and common use cases for developers."
            }
            PromptKind::SectionSummary => {
                "- Introduces the section topic\n- Shows the basic usage\n- Notes common pitfalls"
            }
        }
    }
}

#[async_trait]
impl Llm for OfflineLlm {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        Ok(Self::response_for(prompt.kind).to_string())
    }
}

/// Deterministic embedder: identical text yields identical vectors.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        // Normalize hash bytes to [-1, 1]
        (0..self.dim)
            .map(|i| (hash[i % 32] as f32 / 127.5) - 1.0)
            .collect()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_structured_responses_are_valid_json() {
        let llm = OfflineLlm::new();

        let topics = llm
            .generate(&Prompt::new(PromptKind::TopicExtraction, ""))
            .await
            .unwrap();
        let topics: Vec<String> = serde_json::from_str(&topics).unwrap();
        assert_eq!(topics.len(), 3);

        let faqs = llm.generate(&Prompt::new(PromptKind::KbFaq, "")).await.unwrap();
        let faqs: Vec<serde_json::Value> = serde_json::from_str(&faqs).unwrap();
        assert_eq!(faqs.len(), 3);
    }

    #[tokio::test]
    async fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::new(128);
        let texts = vec!["hello".to_string(), "hello".to_string(), "world".to_string()];
        let vectors = embedder.embed(&texts).await.unwrap();

        assert_eq!(vectors[0].len(), 128);
        assert_eq!(vectors[0], vectors[1]);
        assert_ne!(vectors[0], vectors[2]);
    }
}
