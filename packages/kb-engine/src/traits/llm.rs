//! LLM trait for text generation.
//!
//! Every prompt carries a [`PromptKind`] tag. Real backends ignore it and send
//! the text; offline and test implementations select their response by kind,
//! which gives them an explicit contract instead of matching on prompt text.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// What a prompt asks the model to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// JSON array of exactly three topic labels
    TopicExtraction,
    /// Free-text answer to one question over a retrieved context
    Answer,
    /// JSON array of question/answer objects for one topic
    KbFaq,
    /// Partial summary of a single chunk
    ExecutiveMap,
    /// Final executive summary over the partial summaries
    ExecutiveReduce,
    /// Bullet summary of one section
    SectionSummary,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TopicExtraction => "topic_extraction",
            Self::Answer => "answer",
            Self::KbFaq => "kb_faq",
            Self::ExecutiveMap => "executive_map",
            Self::ExecutiveReduce => "executive_reduce",
            Self::SectionSummary => "section_summary",
        };
        f.write_str(name)
    }
}

/// A rendered prompt and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

impl Prompt {
    pub fn new(kind: PromptKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Text generation backend.
///
/// Fails with [`EngineError::Transport`](crate::error::EngineError::Transport)
/// on network failure, timeout, or a non-2xx response. Implementations never
/// retry on their own.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

#[async_trait]
impl<T: Llm + ?Sized> Llm for Arc<T> {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        (**self).generate(prompt).await
    }
}
