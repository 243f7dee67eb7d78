//! Retrieval context and its citation set.

use serde::{Deserialize, Serialize};

use super::chunk::RetrievalHit;

/// Unique source ids in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationSet(Vec<String>);

impl CitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source id unless already present. Returns whether it was new.
    pub fn insert(&mut self, source_id: &str) -> bool {
        if self.contains(source_id) {
            return false;
        }
        self.0.push(source_id.to_string());
        true
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.0.iter().any(|s| s == source_id)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Ranked hits formatted into a prompt-embeddable string.
///
/// Every hit keeps its own block even when sources repeat; only the
/// citation set is deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Context {
    hits: Vec<RetrievalHit>,
    text: String,
    citations: CitationSet,
}

impl Context {
    /// Assemble a context from hits in the order the index returned them.
    pub fn from_hits(hits: Vec<RetrievalHit>) -> Self {
        let mut citations = CitationSet::new();
        let blocks: Vec<String> = hits
            .iter()
            .map(|hit| {
                citations.insert(&hit.chunk.source_id);
                format!("[{}] {}", hit.chunk.source_id, hit.chunk.text)
            })
            .collect();

        Self {
            text: blocks.join("\n\n"),
            hits,
            citations,
        }
    }

    /// An empty context means there is no grounding for the query.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn hits(&self) -> &[RetrievalHit] {
        &self.hits
    }

    pub fn citations(&self) -> &CitationSet {
        &self.citations
    }

    /// Distance of the best-ranked hit.
    pub fn best_distance(&self) -> Option<f32> {
        self.hits.first().map(|h| h.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chunk::Chunk;

    fn hit(source: &str, seq: usize, distance: f32, rank: usize) -> RetrievalHit {
        RetrievalHit {
            chunk: Chunk::new(source, seq, format!("text {} {}", source, seq)),
            distance,
            rank,
        }
    }

    #[test]
    fn test_citations_dedup_but_blocks_kept() {
        let context = Context::from_hits(vec![
            hit("body", 0, 0.1, 0),
            hit("query-params", 1, 0.2, 1),
            hit("body", 2, 0.3, 2),
        ]);

        assert_eq!(context.hits().len(), 3);
        assert_eq!(context.citations().to_vec(), vec!["body", "query-params"]);
        assert_eq!(context.text().matches("[body]").count(), 2);
        assert_eq!(context.best_distance(), Some(0.1));
    }

    #[test]
    fn test_empty_context() {
        let context = Context::from_hits(vec![]);
        assert!(context.is_empty());
        assert_eq!(context.text(), "");
        assert!(context.citations().is_empty());
        assert_eq!(context.best_distance(), None);
    }
}
