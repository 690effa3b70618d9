//! Document chunking.
//!
//! Splits a document's text into overlapping fixed-size segments,
//! cutting at separator boundaries where one fits inside the size
//! window and falling back to a hard cut otherwise. Consecutive
//! chunks share exactly `overlap` characters, so content spanning a
//! cut point appears whole in at least one chunk.

use sibyl_core::{Chunk, Document, Error, Result};

/// Separator-aware overlapping text splitter.
///
/// Pure function of its input: the same text always produces the same
/// chunk sequence. Offsets are in characters, not bytes.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl Chunker {
    /// Creates a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `chunk_size > 0` and
    /// `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize, separators: Vec<String>) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than 0"));
        }
        if overlap >= chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            separators,
        })
    }

    /// Splits raw text into an ordered sequence of chunks.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < chars.len() {
            let window_end = (start + self.chunk_size).min(chars.len());
            let cut = if window_end < chars.len() {
                self.separator_cut(&chars[start..window_end])
                    .map_or(window_end, |rel| start + rel)
            } else {
                window_end
            };

            let chunk_text: String = chars[start..cut].iter().collect();
            chunks.push(Chunk::new(chunk_text, start, cut, index));
            index += 1;

            if cut >= chars.len() {
                break;
            }
            start = cut - self.overlap;
        }

        chunks
    }

    /// Splits a document, attaching its identity and metadata to every chunk.
    #[must_use]
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.text)
            .into_iter()
            .map(|chunk| chunk.with_document(document))
            .collect()
    }

    /// Finds the last separator boundary inside the window, as a char
    /// offset relative to the window start. Boundaries at or before
    /// the overlap region are rejected so every cut makes progress.
    fn separator_cut(&self, window: &[char]) -> Option<usize> {
        if self.separators.is_empty() {
            return None;
        }
        let window_text: String = window.iter().collect();

        let best_byte_end = self
            .separators
            .iter()
            .filter(|sep| !sep.is_empty())
            .filter_map(|sep| window_text.rfind(sep.as_str()).map(|pos| pos + sep.len()))
            .max()?;

        let char_end = window_text[..best_byte_end].chars().count();
        (char_end > self.overlap).then_some(char_end)
    }
}
