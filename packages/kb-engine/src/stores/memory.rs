//! In-memory storage implementations for testing and development.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::traits::artifacts::ArtifactStore;
use crate::traits::store::{cosine_distance, IndexRecord, VectorIndex};
use crate::types::{chunk::Chunk, faq::FaqReport, summary::SectionSummaries};

/// In-memory vector index.
///
/// Keeps chunks in ingest order. Queries rank by cosine distance; ties keep
/// ingest order.
#[derive(Default)]
pub struct MemoryIndex {
    records: RwLock<IndexMap<String, IndexRecord>>,
}

impl MemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from previously stored records.
    pub fn from_records(records: impl IntoIterator<Item = IndexRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.chunk.id.clone(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// The record set after an upsert, without applying it.
    pub(crate) fn upserted(&self, records: Vec<IndexRecord>) -> IndexMap<String, IndexRecord> {
        let mut map = self.records.read().unwrap_or_else(PoisonError::into_inner).clone();
        for record in records {
            map.insert(record.chunk.id.clone(), record);
        }
        map
    }

    /// The record set without `source_id`, and how many records that drops.
    pub(crate) fn without_source(&self, source_id: &str) -> (IndexMap<String, IndexRecord>, usize) {
        let mut map = self.records.read().unwrap_or_else(PoisonError::into_inner).clone();
        let before = map.len();
        map.retain(|_, r| r.chunk.source_id != source_id);
        let removed = before - map.len();
        (map, removed)
    }

    pub(crate) fn replace(&self, map: IndexMap<String, IndexRecord>) {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = map;
    }

    pub(crate) fn query_sync(&self, vector: &[f32], k: usize) -> Vec<(Chunk, f32)> {
        let map = self.records.read().unwrap_or_else(PoisonError::into_inner);

        let mut scored: Vec<(&IndexRecord, f32)> = map
            .values()
            .map(|r| (r, rankable(cosine_distance(vector, &r.vector))))
            .collect();

        // Stable sort keeps ingest order among equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(r, distance)| (r.chunk.clone(), distance))
            .collect()
    }

    fn len_sync(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Undefined distances (NaN from degenerate vectors) rank last.
fn rankable(distance: f32) -> f32 {
    if distance.is_nan() {
        f32::INFINITY
    } else {
        distance
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<()> {
        let mut map = self.records.write().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            map.insert(record.chunk.id.clone(), record);
        }
        Ok(())
    }

    async fn delete_source(&self, source_id: &str) -> Result<usize> {
        let mut map = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, r| r.chunk.source_id != source_id);
        Ok(before - map.len())
    }

    async fn get_all(&self) -> Result<Vec<Chunk>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|r| r.chunk.clone())
            .collect())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        Ok(self.query_sync(vector, k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.len_sync())
    }
}

/// In-memory artifact store.
///
/// Counts section-map writes so tests can check per-section checkpointing.
#[derive(Default)]
pub struct MemoryArtifactStore {
    faq_report: RwLock<Option<FaqReport>>,
    executive_summary: RwLock<Option<String>>,
    sections: RwLock<SectionSummaries>,
    section_saves: RwLock<Vec<SectionSummaries>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-persisted section map.
    pub fn with_sections(sections: SectionSummaries) -> Self {
        Self {
            sections: RwLock::new(sections),
            ..Self::default()
        }
    }

    /// Every section map written, in write order.
    pub fn section_saves(&self) -> Vec<SectionSummaries> {
        self.section_saves
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save_faq_report(&self, report: &FaqReport) -> Result<()> {
        *self.faq_report.write().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Ok(())
    }

    async fn load_faq_report(&self) -> Result<Option<FaqReport>> {
        Ok(self
            .faq_report
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save_executive_summary(&self, summary: &str) -> Result<()> {
        *self
            .executive_summary
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(summary.to_string());
        Ok(())
    }

    async fn load_executive_summary(&self) -> Result<Option<String>> {
        Ok(self
            .executive_summary
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn load_section_summaries(&self) -> Result<SectionSummaries> {
        Ok(self
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save_section_summaries(&self, summaries: &SectionSummaries) -> Result<()> {
        *self.sections.write().unwrap_or_else(PoisonError::into_inner) = summaries.clone();
        self.section_saves
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(summaries.clone());
        Ok(())
    }
}
