//! Vector index trait.
//!
//! Distance metric and ranking order belong to the implementation. Callers
//! treat the returned order as ground truth and never re-sort.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::chunk::Chunk;

/// A chunk with its embedding, as written to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Store of chunk embeddings with k-nearest-neighbour lookup.
///
/// Assumes a single writer at a time and any number of sequential readers.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records by chunk id.
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<()>;

    /// Remove every chunk of a source. Returns how many were removed.
    async fn delete_source(&self, source_id: &str) -> Result<usize>;

    /// All chunks in ingest order.
    async fn get_all(&self) -> Result<Vec<Chunk>>;

    /// Up to `k` nearest chunks with their distances, closest first.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>>;

    /// Number of stored chunks.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Cosine distance (`1 - similarity`), in `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_distance_range() {
        let a = vec![1.0, 0.0];
        assert!(cosine_distance(&a, &a).abs() < 0.001);
        assert!((cosine_distance(&a, &[-1.0, 0.0]) - 2.0).abs() < 0.001);
        // Mismatched dimensions have no similarity
        assert!((cosine_distance(&a, &[1.0]) - 1.0).abs() < 0.001);
    }
}
