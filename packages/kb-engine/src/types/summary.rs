//! Summary types - executive summary and checkpointed section summaries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `section_id -> summary_text`, in the order sections were completed.
///
/// An entry is durable as soon as it exists; a section present here is
/// never regenerated.
pub type SectionSummaries = IndexMap<String, String>;

/// Result of the map-reduce executive summary stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    /// The reduced summary (or the reduce error text)
    pub summary: String,

    /// Chunks whose map step produced a partial summary
    pub chunks_summarized: usize,

    /// Chunk ids whose map step failed
    pub failed_chunks: Vec<String>,
}

/// Outcome of one section-summary run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionRun {
    /// The full persisted map after the run
    pub summaries: SectionSummaries,

    /// Sections generated during this run
    pub generated: Vec<String>,

    /// Sections skipped because a previous run completed them
    pub skipped: Vec<String>,

    /// Sections whose generation failed (their entry holds the error text)
    pub failed: Vec<String>,
}
