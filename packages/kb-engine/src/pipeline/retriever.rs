//! Query-time retrieval: embed, search, assemble a citation-tagged context.

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::traits::{embedder::Embedder, store::VectorIndex};
use crate::types::{chunk::RetrievalHit, context::Context};

/// Fetches the nearest chunks for a query.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Retrieve the top `k` chunks for `query`.
    ///
    /// Hits keep the index's rank order. An empty index yields an empty
    /// context, not an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Context> {
        if k == 0 || self.index.is_empty().await? {
            debug!(query, "Nothing to retrieve");
            return Ok(Context::default());
        }

        let vector = self.embedder.embed_one(query).await?;
        let hits: Vec<RetrievalHit> = self
            .index
            .query(&vector, k)
            .await?
            .into_iter()
            .enumerate()
            .map(|(rank, (chunk, distance))| RetrievalHit {
                chunk,
                distance,
                rank,
            })
            .collect();

        debug!(query, k, hits = hits.len(), "Retrieved context");
        Ok(Context::from_hits(hits))
    }
}
