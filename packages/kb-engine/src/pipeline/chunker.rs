//! Fixed-size text chunking.
//!
//! Windows are counted in characters, not bytes, so multi-byte text never
//! splits inside a code point. There is no overlap and no boundary detection.

use crate::error::{EngineError, Result};
use crate::types::chunk::{Chunk, Source};

/// Split `text` into contiguous windows of `size` characters.
///
/// The last window may be shorter. Empty text yields no windows.
pub fn chunk_text(text: &str, size: usize) -> Result<Vec<String>> {
    if size == 0 {
        return Err(EngineError::InvalidChunkSize(size));
    }

    let mut windows = Vec::with_capacity(text.len() / size + 1);
    let mut current = String::new();
    let mut count = 0;

    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == size {
            windows.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        windows.push(current);
    }

    Ok(windows)
}

/// Chunk a source document, numbering chunks from zero in text order.
pub fn chunk_source(source: &Source, text: &str, size: usize) -> Result<Vec<Chunk>> {
    Ok(chunk_text(text, size)?
        .into_iter()
        .enumerate()
        .map(|(i, window)| Chunk::new(&source.source_id, i, window))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(chunk_text("abc", 0), Err(EngineError::InvalidChunkSize(0))));
    }

    #[test]
    fn test_exact_and_remainder_windows() {
        assert_eq!(chunk_text("abcdefg", 3).unwrap(), vec!["abc", "def", "g"]);
        assert_eq!(chunk_text("abcdef", 3).unwrap(), vec!["abc", "def"]);
        assert!(chunk_text("", 3).unwrap().is_empty());
    }

    #[test]
    fn test_multibyte_counts_chars() {
        let chunks = chunk_text("héllo wörld", 4).unwrap();
        assert_eq!(chunks, vec!["héll", "o wö", "rld"]);
    }

    #[test]
    fn test_chunk_source_ids() {
        let source = Source::new("path-params", "https://example.com/tutorial/path-params/");
        let chunks = chunk_source(&source, &"x".repeat(2500), 1000).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].id, "path-params_0");
        assert_eq!(chunks[2].id, "path-params_2");
        assert_eq!(chunks[2].text.len(), 500);
        assert!(chunks.iter().all(|c| c.source_id == "path-params"));
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_text(text in "\\PC{0,400}", size in 1usize..64) {
            let chunks = chunk_text(&text, size).unwrap();

            prop_assert_eq!(chunks.concat(), text);
            if let Some((last, rest)) = chunks.split_last() {
                prop_assert!(rest.iter().all(|c| c.chars().count() == size));
                prop_assert!(last.chars().count() >= 1 && last.chars().count() <= size);
            }
        }

        #[test]
        fn prop_chunking_is_deterministic(text in "\\PC{0,200}", size in 1usize..32) {
            prop_assert_eq!(chunk_text(&text, size).unwrap(), chunk_text(&text, size).unwrap());
        }
    }
}
