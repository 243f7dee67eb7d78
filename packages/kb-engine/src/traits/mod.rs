//! Collaborator traits.
//!
//! These define the seams where the engine meets the outside world: the
//! embedding model, the vector index, the LLM backend, the external question
//! source, and artifact persistence.

pub mod artifacts;
pub mod embedder;
pub mod llm;
pub mod searcher;
pub mod store;
