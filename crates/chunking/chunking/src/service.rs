//! Chunking services: a splitting policy paired with a maximum chunk length.

use std::io::BufRead;

use crate::chunker::{Chunker, DEFAULT_MAX_CHUNK_LENGTH};
use crate::splitter::{FixedWidthSplitter, LineSplitter, SentenceSplitter, UnitSplitter, WordSplitter};

/// A text source owned by a chunker.
pub type BoxedSource<'a> = Box<dyn BufRead + Send + 'a>;

/// A splitting policy bound to a source.
pub type BoxedSplitter<'a> = Box<dyn UnitSplitter + Send + 'a>;

/// A chunking policy that can be shared across callers.
///
/// Every call to [`ChunkingService::chunks`] takes ownership of a fresh source, so each
/// chunk sequence is independent and single-pass.
pub trait ChunkingService: Send + Sync {
    /// Maximum chunk length in characters.
    fn max_chunk_length(&self) -> usize;

    /// Binds this policy's splitter to `source`.
    fn splitter<'a>(&self, source: BoxedSource<'a>) -> BoxedSplitter<'a>;

    /// Opens a lazy chunk sequence over `source`.
    fn chunks<'a>(&self, source: BoxedSource<'a>) -> Chunker<BoxedSplitter<'a>> {
        Chunker::new(self.splitter(source), self.max_chunk_length())
    }

    /// Opens a lazy chunk sequence over an in-memory string.
    fn chunk_text<'a>(&self, text: &'a str) -> Chunker<BoxedSplitter<'a>> {
        self.chunks(Box::new(text.as_bytes()))
    }
}

/// Line-based chunking, the default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChunking {
    max_chunk_length: usize,
    keep_line_endings: bool,
}

impl LineChunking {
    pub fn new(max_chunk_length: usize) -> Self {
        Self {
            max_chunk_length,
            keep_line_endings: false,
        }
    }

    /// Keep a `\n` at the end of each line instead of dropping terminators.
    pub fn with_line_endings(mut self, keep: bool) -> Self {
        self.keep_line_endings = keep;
        self
    }
}

impl Default for LineChunking {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

impl ChunkingService for LineChunking {
    fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    fn splitter<'a>(&self, source: BoxedSource<'a>) -> BoxedSplitter<'a> {
        Box::new(LineSplitter::new(source).with_line_endings(self.keep_line_endings))
    }
}

/// Sentence-based chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunking {
    max_chunk_length: usize,
}

impl SentenceChunking {
    pub fn new(max_chunk_length: usize) -> Self {
        Self { max_chunk_length }
    }
}

impl Default for SentenceChunking {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

impl ChunkingService for SentenceChunking {
    fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    fn splitter<'a>(&self, source: BoxedSource<'a>) -> BoxedSplitter<'a> {
        Box::new(SentenceSplitter::new(source))
    }
}

/// Word-based chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChunking {
    max_chunk_length: usize,
}

impl WordChunking {
    pub fn new(max_chunk_length: usize) -> Self {
        Self { max_chunk_length }
    }
}

impl Default for WordChunking {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

impl ChunkingService for WordChunking {
    fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    fn splitter<'a>(&self, source: BoxedSource<'a>) -> BoxedSplitter<'a> {
        Box::new(WordSplitter::new(source))
    }
}

/// Fixed-width chunking. Units are `width` characters; with `width <= max_chunk_length`
/// no chunk ever exceeds the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidthChunking {
    max_chunk_length: usize,
    width: usize,
}

impl FixedWidthChunking {
    pub fn new(max_chunk_length: usize, width: usize) -> Self {
        Self {
            max_chunk_length,
            width,
        }
    }
}

impl ChunkingService for FixedWidthChunking {
    fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    fn splitter<'a>(&self, source: BoxedSource<'a>) -> BoxedSplitter<'a> {
        Box::new(FixedWidthSplitter::new(source, self.width))
    }
}
