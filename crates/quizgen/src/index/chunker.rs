//! Text chunking for index construction

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;

/// Sentence-aware text chunker with configurable size and overlap
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    min_size: usize,
}

impl TextChunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_size: config.min_chunk_size,
        }
    }

    /// Split page text into overlapping chunks along sentence boundaries.
    ///
    /// Chunks shorter than the minimum size are dropped, except when the
    /// whole page is that short.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in text.split_sentence_bounds() {
            if !current.is_empty() && current.len() + sentence.len() > self.chunk_size {
                if current.trim().len() >= self.min_size {
                    chunks.push(current.trim().to_string());
                }
                current = self.overlap_tail(&current);
            }
            current.push_str(sentence);
        }

        if current.trim().len() >= self.min_size {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    /// Carry the end of the previous chunk into the next one
    fn overlap_tail(&self, text: &str) -> String {
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let tail = &text[start..];

        // Prefer a sentence boundary, then a word boundary
        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
            min_chunk_size: 10,
        })
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunker(1000, 200).split("A single short page.");
        assert_eq!(chunks, vec!["A single short page.".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(chunker(1000, 200).split("   ").is_empty());
    }

    #[test]
    fn long_text_splits_with_overlap() {
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        let text = sentence.repeat(20);
        let chunks = chunker(200, 50).split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 200 + sentence.len());
        }
        // Overlap means consecutive chunks share trailing/leading material
        assert!(chunks[1].starts_with("The quick") || chunks[1].contains("fox"));
    }
}
