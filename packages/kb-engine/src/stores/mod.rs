//! Storage implementations.
//!
//! Available backends:
//! - `MemoryIndex` / `MemoryArtifactStore` - in-memory (tests, development)
//! - `FileIndex` / `FsArtifactStore` - JSON and text files under a data directory

pub mod file;
pub mod memory;

pub use file::{FileIndex, FsArtifactStore, DEFAULT_COLLECTION};
pub use memory::{MemoryArtifactStore, MemoryIndex};
