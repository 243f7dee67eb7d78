//! Embedding trait.

use async_trait::async_trait;

use crate::error::{EngineError, Result};

/// Turns text into dense vectors. Pure: same input, same output.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Embedding("embedder returned no vector".into()))
    }
}
