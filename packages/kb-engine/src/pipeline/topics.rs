//! Topic extraction over a corpus sample.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::parse::{parse_json, Structured};
use crate::pipeline::prompts::{format_topic_prompt, truncate_chars};
use crate::traits::{llm::Llm, store::VectorIndex};
use crate::types::config::EngineConfig;

/// Number of topics a run always works with.
pub const TOPIC_COUNT: usize = 3;

/// Proposes exactly three topics for a run.
#[derive(Clone)]
pub struct TopicExtractor {
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn Llm>,
    config: EngineConfig,
}

impl TopicExtractor {
    pub fn new(index: Arc<dyn VectorIndex>, llm: Arc<dyn Llm>, config: EngineConfig) -> Self {
        Self { index, llm, config }
    }

    /// Return caller-supplied topics verbatim, or extract them from the corpus.
    ///
    /// Extraction never fails on model behaviour: malformed or short output,
    /// a transport error, or an empty corpus all yield the default topics.
    /// Only an index read failure is an error.
    pub async fn extract_topics(&self, custom_topics: Option<&[String]>) -> Result<Vec<String>> {
        match custom_topics {
            Some(topics) if topics.len() == TOPIC_COUNT => {
                debug!(?topics, "Using caller-supplied topics");
                return Ok(topics.to_vec());
            }
            Some(topics) => {
                warn!(count = topics.len(), "Ignoring custom topics, exactly 3 are required");
            }
            None => {}
        }

        let chunks = self.index.get_all().await?;
        if chunks.is_empty() {
            info!("Empty corpus, using default topics");
            return Ok(self.defaults());
        }

        let sample = chunks
            .iter()
            .take(self.config.topic_sample_size)
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let sample = truncate_chars(&sample, self.config.topic_char_budget);

        let raw = match self.llm.generate(&format_topic_prompt(sample)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Topic extraction failed, using default topics");
                return Ok(self.defaults());
            }
        };

        match parse_json::<Vec<String>>(&raw) {
            Structured::Parsed(topics) => {
                let topics: Vec<String> = topics
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .take(TOPIC_COUNT)
                    .collect();

                if topics.len() == TOPIC_COUNT {
                    info!(?topics, "Extracted topics");
                    Ok(topics)
                } else {
                    warn!(count = topics.len(), "Too few topics extracted, using defaults");
                    Ok(self.defaults())
                }
            }
            Structured::Malformed(raw) => {
                warn!(raw = %truncate_chars(&raw, 200), "Malformed topic output, using defaults");
                Ok(self.defaults())
            }
        }
    }

    fn defaults(&self) -> Vec<String> {
        self.config.default_topics.to_vec()
    }
}
