//! Persistence for generated artifacts.
//!
//! One fixed logical location per artifact type; every save overwrites it.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{faq::FaqReport, summary::SectionSummaries};

/// Durable storage for FAQ reports and summaries.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replace the stored FAQ report.
    async fn save_faq_report(&self, report: &FaqReport) -> Result<()>;

    async fn load_faq_report(&self) -> Result<Option<FaqReport>>;

    /// Replace the stored executive summary.
    async fn save_executive_summary(&self, summary: &str) -> Result<()>;

    async fn load_executive_summary(&self) -> Result<Option<String>>;

    /// The persisted section map; empty when nothing was saved yet.
    async fn load_section_summaries(&self) -> Result<SectionSummaries>;

    /// Replace the persisted section map.
    async fn save_section_summaries(&self, summaries: &SectionSummaries) -> Result<()>;
}
