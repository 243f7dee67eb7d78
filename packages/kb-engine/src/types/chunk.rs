//! Corpus types - sources, chunks, and retrieval hits.

use serde::{Deserialize, Serialize};
use url::Url;

/// Logical document identity.
///
/// A source owns 1..N chunks produced in original-text order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Stable identifier used in chunk ids and citations
    pub source_id: String,

    /// Where the text came from (URL or filename)
    pub origin: String,
}

impl Source {
    /// Create a source with an explicit id.
    pub fn new(source_id: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            origin: origin.into(),
        }
    }

    /// Derive a source from a documentation URL.
    ///
    /// The id is the last non-empty path segment, so
    /// `https://fastapi.tiangolo.com/tutorial/path-params/` becomes `path-params`.
    /// Falls back to the host when the path is empty.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let id = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .or_else(|| parsed.host_str().map(str::to_string))?;

        Some(Self::new(id, url))
    }

    /// Derive a source from an uploaded file name (id is the file stem).
    pub fn from_file(name: &str) -> Self {
        let file_name = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        };
        Self::new(stem, name)
    }
}

/// A fixed-size passage of a source's text.
///
/// Immutable once created. Replaced wholesale when its source is re-ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `{source_id}_{sequence_index}`
    pub id: String,

    /// The passage text
    pub text: String,

    /// Owning source
    pub source_id: String,

    /// Position within the source, contiguous from zero
    pub sequence_index: usize,
}

impl Chunk {
    /// Create a chunk, deriving its id from source and position.
    pub fn new(source_id: impl Into<String>, sequence_index: usize, text: impl Into<String>) -> Self {
        let source_id = source_id.into();
        Self {
            id: Self::make_id(&source_id, sequence_index),
            text: text.into(),
            source_id,
            sequence_index,
        }
    }

    /// Build the canonical chunk id.
    pub fn make_id(source_id: &str, sequence_index: usize) -> String {
        format!("{}_{}", source_id, sequence_index)
    }
}

/// A chunk returned for a query, with its distance and rank.
///
/// Transient: produced fresh per query and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    pub distance: f32,
    /// Zero-based position in the index's ranking
    pub rank: usize,
}
