//! Corpus summarization.
//!
//! Two independent stages over the whole index:
//! - an executive summary built map-reduce style from the first chunks
//! - checkpointed per-section summaries that resume where a previous run
//!   stopped

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::prompts::{
    format_executive_map_prompt, format_executive_reduce_prompt, format_section_prompt,
    truncate_chars,
};
use crate::traits::{artifacts::ArtifactStore, llm::Llm, store::VectorIndex};
use crate::types::{
    chunk::Chunk,
    config::EngineConfig,
    summary::{ExecutiveSummary, SectionRun},
};

/// Executive summary stored for an empty corpus.
pub const EMPTY_CORPUS_SUMMARY: &str = "No documents available to summarize.";

/// Executive summary stored when every map step failed.
pub const NO_PARTIAL_SUMMARIES: &str = "Executive summary unavailable: no excerpt could be summarized.";

pub struct SummaryPipeline {
    index: Arc<dyn VectorIndex>,
    llm: Arc<dyn Llm>,
    artifacts: Arc<dyn ArtifactStore>,
    config: EngineConfig,
}

impl SummaryPipeline {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn Llm>,
        artifacts: Arc<dyn ArtifactStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            index,
            llm,
            artifacts,
            config,
        }
    }

    /// Build and persist the executive summary.
    ///
    /// Failed map steps are left out of the reduce input and listed in
    /// `failed_chunks`. A failed reduce stores its error text as the summary.
    pub async fn executive_summary(&self) -> Result<ExecutiveSummary> {
        let chunks = self.index.get_all().await?;

        if chunks.is_empty() {
            info!("Empty corpus, nothing to summarize");
            self.artifacts.save_executive_summary(EMPTY_CORPUS_SUMMARY).await?;
            return Ok(ExecutiveSummary {
                summary: EMPTY_CORPUS_SUMMARY.to_string(),
                chunks_summarized: 0,
                failed_chunks: Vec::new(),
            });
        }

        let mut partials = Vec::new();
        let mut failed_chunks = Vec::new();

        for chunk in chunks.iter().take(self.config.executive_map_chunks) {
            let content = truncate_chars(&chunk.text, self.config.executive_chunk_chars);
            match self.llm.generate(&format_executive_map_prompt(content)).await {
                Ok(partial) => {
                    debug!(chunk = %chunk.id, "Summarized chunk");
                    partials.push(partial);
                }
                Err(e) => {
                    warn!(chunk = %chunk.id, error = %e, "Chunk summary failed");
                    failed_chunks.push(chunk.id.clone());
                }
            }
        }

        let summary = if partials.is_empty() {
            warn!("Every chunk summary failed, skipping reduce");
            NO_PARTIAL_SUMMARIES.to_string()
        } else {
            let joined = partials.join("\n\n");
            let input = truncate_chars(&joined, self.config.executive_reduce_chars);
            match self.llm.generate(&format_executive_reduce_prompt(input)).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(error = %e, "Executive summary reduce failed");
                    format!("Error generating executive summary: {}", e)
                }
            }
        };

        self.artifacts.save_executive_summary(&summary).await?;
        info!(
            summarized = partials.len(),
            failed = failed_chunks.len(),
            "Executive summary saved"
        );

        Ok(ExecutiveSummary {
            summary,
            chunks_summarized: partials.len(),
            failed_chunks,
        })
    }

    /// Summarize every section not already in the persisted map.
    ///
    /// The full map is saved after each section. A generation error is
    /// stored as that section's summary, so the section counts as done and
    /// is not retried by later runs.
    pub async fn section_summaries(&self) -> Result<SectionRun> {
        let mut summaries = self.artifacts.load_section_summaries().await?;
        let sections = first_chunk_per_section(self.index.get_all().await?);

        let mut run = SectionRun::default();

        for (section, chunk) in sections {
            if summaries.contains_key(&section) {
                debug!(section = %section, "Section already summarized");
                run.skipped.push(section);
                continue;
            }

            let content = truncate_chars(&chunk.text, self.config.section_chunk_chars);
            let summary = match self.llm.generate(&format_section_prompt(&section, content)).await {
                Ok(summary) => {
                    run.generated.push(section.clone());
                    summary
                }
                Err(e) => {
                    warn!(section = %section, error = %e, "Section summary failed");
                    run.failed.push(section.clone());
                    format!("Error generating summary: {}", e)
                }
            };

            summaries.insert(section, summary);
            self.artifacts.save_section_summaries(&summaries).await?;
        }

        info!(
            generated = run.generated.len(),
            skipped = run.skipped.len(),
            failed = run.failed.len(),
            "Section summaries complete"
        );

        run.summaries = summaries;
        Ok(run)
    }
}

/// Group chunks by source in first-seen order, keeping each source's
/// lowest-sequence chunk.
fn first_chunk_per_section(chunks: Vec<Chunk>) -> IndexMap<String, Chunk> {
    let mut sections: IndexMap<String, Chunk> = IndexMap::new();
    for chunk in chunks {
        match sections.get(&chunk.source_id) {
            Some(existing) if existing.sequence_index <= chunk.sequence_index => {}
            _ => {
                sections.insert(chunk.source_id.clone(), chunk);
            }
        }
    }
    sections
}
