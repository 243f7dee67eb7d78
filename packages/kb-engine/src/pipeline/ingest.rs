//! Ingestion pipeline - chunk, embed, and index documents.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::pipeline::chunker::chunk_source;
use crate::traits::{
    embedder::Embedder,
    store::{IndexRecord, VectorIndex},
};
use crate::types::chunk::Source;

/// A document ready for indexing.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: Source,
    pub text: String,
}

impl Document {
    pub fn new(source: Source, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }
}

/// Result of an ingest operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Chunks indexed per source, in ingest order
    pub chunks_per_source: IndexMap<String, usize>,

    /// Sources with no text
    pub empty_sources: Vec<String>,

    /// Sources that failed, with the error text
    pub failed_sources: Vec<(String, String)>,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize {
        self.chunks_per_source.values().sum()
    }

    /// Check if the ingest was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed_sources.is_empty()
    }
}

/// Chunks, embeds, and indexes documents.
///
/// Re-ingesting a source replaces all of its chunks.
#[derive(Clone)]
pub struct Ingestor {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
}

impl Ingestor {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, chunk_size: usize) -> Self {
        Self {
            index,
            embedder,
            chunk_size,
        }
    }

    /// Ingest documents one after another.
    ///
    /// An invalid chunk size is rejected up front. Per-document failures are
    /// recorded in the report and do not stop the batch.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        if self.chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize(self.chunk_size));
        }

        let mut report = IngestReport::default();

        for document in documents {
            let source_id = &document.source.source_id;
            match self.ingest_one(document).await {
                Ok(0) => {
                    warn!(source = %source_id, "Document has no text");
                    report.empty_sources.push(source_id.clone());
                }
                Ok(count) => {
                    report.chunks_per_source.insert(source_id.clone(), count);
                }
                Err(e) => {
                    warn!(source = %source_id, error = %e, "Failed to ingest document");
                    report.failed_sources.push((source_id.clone(), e.to_string()));
                }
            }
        }

        info!(
            sources = report.chunks_per_source.len(),
            chunks = report.total_chunks(),
            failed = report.failed_sources.len(),
            "Ingest complete"
        );
        Ok(report)
    }

    /// Ingest a single document, returning its chunk count.
    pub async fn ingest_one(&self, document: &Document) -> Result<usize> {
        let chunks = chunk_source(&document.source, &document.text, self.chunk_size)?;
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(EngineError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let replaced = self.index.delete_source(&document.source.source_id).await?;
        let count = chunks.len();
        let records = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexRecord { chunk, vector })
            .collect();
        self.index.upsert(records).await?;

        info!(
            source = %document.source.source_id,
            chunks = count,
            replaced,
            "Indexed document"
        );
        Ok(count)
    }
}

/// One source in the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOverview {
    pub source_id: String,
    pub chunks: usize,
}

/// What the knowledge base currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseOverview {
    pub total_chunks: usize,
    pub sources: Vec<SourceOverview>,
}

/// List sources with chunk counts, in ingest order.
pub async fn overview(index: &dyn VectorIndex) -> Result<KnowledgeBaseOverview> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    let chunks = index.get_all().await?;
    for chunk in &chunks {
        *counts.entry(chunk.source_id.clone()).or_default() += 1;
    }

    Ok(KnowledgeBaseOverview {
        total_chunks: chunks.len(),
        sources: counts
            .into_iter()
            .map(|(source_id, chunks)| SourceOverview { source_id, chunks })
            .collect(),
    })
}
