//! Configuration for ingestion, retrieval, and the generation pipelines.

use serde::{Deserialize, Serialize};

use super::faq::AnswerMode;

/// Engine-wide knobs.
///
/// Every character budget bounds prompt size regardless of corpus size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Characters per chunk at ingest time. Default: 1000.
    pub chunk_size: usize,

    /// Hits retrieved when answering a single question. Default: 3.
    pub answer_top_k: usize,

    /// Hits retrieved for corpus-only FAQ generation. Default: 5.
    pub kb_fallback_top_k: usize,

    /// Corpus chunks sampled for topic extraction. Default: 10.
    pub topic_sample_size: usize,

    /// Character budget for the topic-extraction sample. Default: 3000.
    pub topic_char_budget: usize,

    /// Returned when topic extraction output is unusable.
    pub default_topics: [String; 3],

    /// Q/A pairs requested per topic on the corpus-only branch. Default: 3.
    pub faqs_per_topic: usize,

    /// External questions answered per topic. Default: 3.
    pub external_candidates: usize,

    /// Candidates requested from the question source. Default: 10.
    pub external_search_limit: usize,

    /// Chunks summarized in the executive map step. Default: 8.
    pub executive_map_chunks: usize,

    /// Per-chunk character budget for the map step. Default: 1000.
    pub executive_chunk_chars: usize,

    /// Character budget for the reduce step input. Default: 4000.
    pub executive_reduce_chars: usize,

    /// Character budget for a section's first chunk. Default: 800.
    pub section_chunk_chars: usize,

    /// Answer mode used by the FAQ pipeline. Default: strict.
    pub mode: AnswerMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            answer_top_k: 3,
            kb_fallback_top_k: 5,
            topic_sample_size: 10,
            topic_char_budget: 3000,
            default_topics: [
                "Getting Started".to_string(),
                "Core Concepts".to_string(),
                "Common Patterns".to_string(),
            ],
            faqs_per_topic: 3,
            external_candidates: 3,
            external_search_limit: 10,
            executive_map_chunks: 8,
            executive_chunk_chars: 1000,
            executive_reduce_chars: 4000,
            section_chunk_chars: 800,
            mode: AnswerMode::Strict,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the answer mode.
    pub fn with_mode(mut self, mode: AnswerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the number of hits used to answer a question.
    pub fn with_answer_top_k(mut self, k: usize) -> Self {
        self.answer_top_k = k;
        self
    }

    /// Replace the fallback topic triple.
    pub fn with_default_topics(mut self, topics: [&str; 3]) -> Self {
        self.default_topics = topics.map(str::to_string);
        self
    }

    /// Set how many chunks the executive summary maps over.
    pub fn with_executive_map_chunks(mut self, chunks: usize) -> Self {
        self.executive_map_chunks = chunks;
        self
    }
}
